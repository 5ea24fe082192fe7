use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

lazy_static! {
    static ref TAGS: Regex = Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][^<>]*>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalizes a fragment of markup into plain text
///
/// Entities are decoded, tags removed, non-breaking spaces treated as ordinary
/// spaces and runs of whitespace (including newlines) collapsed to one space.
/// Markup that arrives entity-escaped is decoded and stripped as well, so the
/// result is stable under a second pass. Malformed markup degrades to whatever
/// text survives; this never fails.
///
/// # Arguments
/// * `element` - Raw markup or text
///
/// # Returns
/// The trimmed text. Cleaning an already clean string returns it unchanged.
pub fn clean(element: &str) -> String {
    let mut text = clean_pass(element);
    loop {
        // Every pass that changes the text shortens it or only rewrites whitespace
        let next = clean_pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn clean_pass(element: &str) -> String {
    let text = html_escape::decode_html_entities(element);
    let text = TAGS.replace_all(&text, " ").replace('\u{a0}', " ");

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Normalized text content of an element, including its descendants
pub fn element_text(element: ElementRef<'_>) -> String {
    clean(&element.inner_html())
}

/// Parses a numeric attribute, defaulting to zero when absent or malformed
///
/// # Arguments
/// * `raw` - The attribute value, if present
///
/// # Returns
/// The parsed value, or `T::default()`
pub fn parse_or_default<T>(raw: Option<&str>) -> T
where
    T: Default + std::str::FromStr,
{
    raw.map(str::trim)
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_tags_and_whitespace() {
        assert_eq!(clean("  <b>CS</b>\n   141 "), "CS 141");
        assert_eq!(clean("<p class=\"x\">Data\r\n\r\n  Structures</p>"), "Data Structures");
        assert_eq!(clean("a<!-- hidden -->b"), "a b");
    }

    #[test]
    fn test_clean_decodes_entities() {
        assert_eq!(clean("I&amp;C&#160;SCI&nbsp;31"), "I&C SCI 31");
        assert_eq!(clean("grade &gt;= C"), "grade >= C");
        assert_eq!(clean("CS\u{a0}141"), "CS 141");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for raw in [
            "<td> COMPSCI&nbsp;161 </td>",
            "( CS 141 ) AND ( CS 142 OR CS 143 ( min grade = C ) )",
            "a < b",
            "x &lt;b&gt;y&lt;/b&gt; z",
            "&amp;lt;i&amp;gt;nested&amp;lt;/i&amp;gt;",
            "",
        ] {
            let once = clean(raw);
            assert_eq!(clean(&once), once);
        }
    }

    #[test]
    fn test_clean_strips_escaped_markup() {
        assert_eq!(clean("x &lt;b&gt;y&lt;/b&gt; z"), "x y z");
        assert_eq!(clean("&amp;lt;i&amp;gt;nested&amp;lt;/i&amp;gt;"), "nested");
        assert_eq!(clean("a &lt; b"), "a < b");
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or_default::<f64>(Some(" 3.5 ")), 3.5);
        assert_eq!(parse_or_default::<f64>(Some("n/a")), 0.0);
        assert_eq!(parse_or_default::<usize>(None), 0);
    }
}
