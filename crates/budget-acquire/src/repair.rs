use crate::error::{AcquireError, Result};
use scraper::{Html, Selector};
use unicode_normalization::UnicodeNormalization;

/// Turn a raw response body into well-formed markup.
///
/// The body must be UTF-8. Non-breaking spaces (entity or literal) become
/// plain spaces, text is NFC-normalized, and the document is parsed by
/// html5ever and serialized back out, which closes stray tags and
/// reconstructs the `html`/`body` skeleton.
pub fn repair(raw: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| AcquireError::Repair(format!("body is not valid UTF-8: {e}")))?;

    let text = normalize_spaces(text);
    let text: String = text.nfc().collect();

    let document = Html::parse_document(&text);
    let body_sel = Selector::parse("body > *").expect("valid selector");
    if document.select(&body_sel).next().is_none() {
        return Err(AcquireError::Repair("document has no body content".into()));
    }

    Ok(document.html())
}

/// Replace `&nbsp;` entities and U+00A0 with ordinary spaces.
pub fn normalize_spaces(input: &str) -> String {
    input.replace("&nbsp;", " ").replace('\u{a0}', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_spaces() {
        assert_eq!(normalize_spaces("1&nbsp;250\u{a0}000"), "1 250 000");
    }

    #[test]
    fn test_repair_closes_unbalanced_markup() {
        let raw = b"<html><body><h2>Budget&nbsp;2015<table><tr><td>x</body>";
        let html = repair(raw).unwrap();
        assert!(html.contains("<h2>Budget 2015"));
        assert!(html.contains("</table>"));
        assert!(html.ends_with("</html>"));
        assert!(!html.contains("&nbsp;"));
    }

    #[test]
    fn test_repair_rejects_invalid_utf8() {
        let raw = [b'<', b'p', b'>', 0xff, 0xfe];
        assert!(matches!(repair(&raw), Err(AcquireError::Repair(_))));
    }

    #[test]
    fn test_repair_rejects_empty_document() {
        assert!(matches!(repair(b"   "), Err(AcquireError::Repair(_))));
    }

    #[test]
    fn test_repair_nfc() {
        let html = repair("<p>e\u{0301}tat</p>".as_bytes()).unwrap();
        assert!(html.contains("état"));
    }
}
