use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<option value="(\d+)"[^>]*>(.*?)</option>"#).expect("invalid regex: option")
});

/// Extract `<option value="N">label</option>` pairs from a listing page.
///
/// Pairs come back in document order, which is the order the site lists
/// them in. Ids must be numeric; placeholder options with an empty or
/// textual value are not matched. Labels are trimmed. When an id appears
/// more than once the first label is kept. An input without options yields
/// an empty list.
pub fn parse_options(html: &str) -> Vec<(u32, String)> {
    let mut seen = HashSet::new();
    let mut options = Vec::new();

    for caps in OPTION_RE.captures_iter(html) {
        let Ok(id) = caps[1].parse::<u32>() else {
            tracing::debug!(value = &caps[1], "Skipping option with out-of-range id");
            continue;
        };
        let label = caps[2].trim().to_string();

        if !seen.insert(id) {
            tracing::debug!(id, ignored = %label, "Duplicate option id");
            continue;
        }
        options.push((id, label));
    }

    options
}
