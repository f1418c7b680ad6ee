//! Snippet cleanup: strip search-highlight tags and decode the handful of
//! HTML entities the search endpoint emits into plain text.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Remove `<span class="searchmatch">` style highlight markup and decode
/// entities. The result is plain display text.
pub(crate) fn strip_highlights(snippet: &str) -> String {
    let stripped = TAG_RE.replace_all(snippet, "");
    decode_entities(&stripped)
}

fn decode_entities(text: &str) -> String {
    // `&amp;` last, so double-escaped entities survive one level
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_highlight_spans() {
        let snippet = r#"<span class="searchmatch">Graph</span> theory is the study of <span class="searchmatch">graphs</span>"#;
        assert_eq!(
            strip_highlights(snippet),
            "Graph theory is the study of graphs"
        );
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            strip_highlights("Euler&#039;s &quot;Seven Bridges&quot; &amp; more"),
            "Euler's \"Seven Bridges\" & more"
        );
    }

    #[test]
    fn double_escaped_amp_decodes_one_level() {
        assert_eq!(strip_highlights("&amp;lt;"), "&lt;");
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(strip_highlights("no markup here"), "no markup here");
    }
}
