use anyhow::{Context, Result};
use budget_model::{flatten, BudgetRecord, DataType, FlatRow, RecordKey, FLAT_HEADER};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Load every persisted record of one data type from `input_dir`.
///
/// Files are matched by name (`{region}-{municipality}-{type}.json`) and
/// returned ordered by region id, then municipality id. Anything else in
/// the directory is ignored.
pub fn load_records(input_dir: &Path, data_type: DataType) -> Result<Vec<BudgetRecord>> {
    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read record directory {}", input_dir.display()))?;

    let mut keyed = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let key: RecordKey = match name.parse() {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!(file = %name, "Skipping: {e}");
                continue;
            }
        };
        if key.data_type != data_type || !name.ends_with(".json") {
            continue;
        }
        keyed.push((key, path));
    }
    keyed.sort();

    let mut records = Vec::with_capacity(keyed.len());
    for (_, path) in keyed {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record: BudgetRecord = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        records.push(record);
    }

    tracing::info!(
        dir = %input_dir.display(),
        data_type = %data_type,
        records = records.len(),
        "Loaded budget records"
    );
    Ok(records)
}

/// Write flat rows as `;`-separated text.
///
/// The header line is written bare; every data field is double-quoted.
pub fn write_csv<W: Write>(rows: &[FlatRow], mut writer: W) -> Result<()> {
    writeln!(writer, "{}", FLAT_HEADER.join(";"))?;

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Always)
        .has_headers(false)
        .from_writer(&mut writer);
    for row in rows {
        csv_writer.write_record(row.fields())?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Flatten all records of one type into `output_dir/{type}.csv`.
///
/// Returns the output path and the number of data rows written.
pub fn export(input_dir: &Path, output_dir: &Path, data_type: DataType) -> Result<(PathBuf, usize)> {
    let records = load_records(input_dir, data_type)?;
    let rows = flatten(&records);

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.csv", data_type.slug()));

    let mut tmp = tempfile::NamedTempFile::new_in(output_dir)?;
    write_csv(&rows, std::io::BufWriter::new(tmp.as_file_mut()))?;
    tmp.persist(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = rows.len(), "Wrote combined CSV");
    Ok((path, rows.len()))
}

/// Export both revenue and expense CSV files.
pub fn export_all(input_dir: &Path, output_dir: &Path) -> Result<Vec<(PathBuf, usize)>> {
    DataType::ALL
        .into_iter()
        .map(|data_type| export(input_dir, output_dir, data_type))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use budget_model::{Article, Chapter, Municipality, Region, SubChapter};

    const HEADER: &str =
        "Date;RegionId;RegionLabel;MunicipaliteId;MunicipaliteLabel;Chapter;SubChapter;Article;Predicted;Current;Done\n";

    fn record(region: u32, municipality: u32, data_type: DataType, article: &str) -> BudgetRecord {
        BudgetRecord {
            region: Region { id: region, label: format!("R{region}") },
            municipality: Municipality { id: municipality, label: format!("M{municipality}") },
            title: "Budget".into(),
            date: "2015-03-14".into(),
            data_type,
            chapters: vec![Chapter {
                title: "Titre I".into(),
                subchapters: vec![SubChapter {
                    title: "Partie 1".into(),
                    articles: vec![Article {
                        title: article.into(),
                        predicted: "1 000".into(),
                        current: "1 200".into(),
                        done: "800,5".into(),
                    }],
                }],
            }],
        }
    }

    fn save(dir: &Path, record: &BudgetRecord) {
        let json = serde_json::to_string(record).unwrap();
        fs::write(dir.join(record.key().file_name()), json).unwrap();
    }

    fn csv_string(rows: &[FlatRow]) -> String {
        let mut buf = Vec::new();
        write_csv(rows, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_no_records_is_header_only() {
        assert_eq!(csv_string(&[]), HEADER);
    }

    #[test]
    fn test_rows_are_quoted() {
        let rows = flatten(&[record(11, 1101, DataType::Revenue, "Taxe \"TIB\"")]);
        let out = csv_string(&rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            r#""2015-03-14";"11";"R11";"1101";"M1101";"Titre I";"Partie 1";"Taxe ""TIB""";"1 000";"1 200";"800,5""#
        );
    }

    #[test]
    fn test_load_filters_and_orders_records() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), &record(10, 1, DataType::Revenue, "third"));
        save(dir.path(), &record(2, 7, DataType::Revenue, "second"));
        save(dir.path(), &record(2, 5, DataType::Revenue, "first"));
        save(dir.path(), &record(2, 5, DataType::Expense, "expense"));
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        fs::create_dir(dir.path().join("raw")).unwrap();

        let records = load_records(dir.path(), DataType::Revenue).unwrap();
        let titles: Vec<&str> = records
            .iter()
            .map(|r| r.chapters[0].subchapters[0].articles[0].title.as_str())
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_export_all_writes_both_files() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        save(input.path(), &record(1, 1, DataType::Revenue, "loyer"));

        let written = export_all(input.path(), output.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].1, 1);
        assert_eq!(written[1].1, 0);

        let revenue = fs::read_to_string(output.path().join("recette.csv")).unwrap();
        assert!(revenue.starts_with(HEADER));
        assert!(revenue.contains(r#""loyer""#));

        let expense = fs::read_to_string(output.path().join("depense.csv")).unwrap();
        assert_eq!(expense, HEADER);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1-1-recette.json"), "{ not json").unwrap();
        assert!(load_records(dir.path(), DataType::Revenue).is_err());
    }
}
