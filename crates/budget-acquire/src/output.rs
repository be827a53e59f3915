use crate::error::Result;
use budget_model::{BudgetRecord, RecordKey};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a record as `{region}-{municipality}-{type}.json` in `output_dir`.
///
/// The JSON is written to a temp file in the same directory and renamed
/// into place, so a failed run never leaves a truncated record behind.
pub fn write_record(record: &BudgetRecord, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let json = serde_json::to_string_pretty(record)?;
    let path = output_dir.join(record.key().file_name());
    write_atomic(&path, json.as_bytes())?;

    tracing::info!(
        path = %path.display(),
        chapters = record.chapters.len(),
        articles = record.article_count(),
        "Wrote budget record"
    );

    Ok(path)
}

/// Read a record written by [`write_record`].
pub fn read_record(path: &Path) -> Result<BudgetRecord> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Cache the repaired HTML of a budget page under `output_dir/raw/`.
///
/// Lets a page be re-extracted without fetching it again.
pub fn cache_html(output_dir: &Path, key: &RecordKey, html: &str) -> Result<PathBuf> {
    let dir = output_dir.join("raw");
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{key}.html"));
    write_atomic(&path, html.as_bytes())?;
    tracing::info!(path = %path.display(), bytes = html.len(), "Cached page HTML");
    Ok(path)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
