//! Text-level cleanup applied to every free-text field the model returns.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        "[",
        "\u{1F600}-\u{1F64F}",
        "\u{1F300}-\u{1F5FF}",
        "\u{1F680}-\u{1F6FF}",
        "\u{1F1E0}-\u{1F1FF}",
        "\u{2700}-\u{27BF}",
        "\u{1F900}-\u{1F9FF}",
        "\u{1FA70}-\u{1FAFF}",
        "\u{2600}-\u{26FF}",
        "\u{FE0F}",
        "]+"
    ))
    .expect("valid regex")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strips markup and emoji, collapses whitespace and caps the result at
/// `max_len` characters. Returns an empty string when nothing is left.
///
/// Idempotent: `clean_text(&clean_text(s, n), n) == clean_text(s, n)`.
pub fn clean_text(value: &str, max_len: usize) -> String {
    let text = HTML_TAG.replace_all(value, " ");
    let text = EMOJI.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = text.trim();

    if text.chars().count() > max_len {
        text.chars()
            .take(max_len)
            .collect::<String>()
            .trim_end()
            .to_string()
    } else {
        text.to_string()
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_tags_and_collapses_whitespace() {
        assert_eq!(
            clean_text("  Led <b>payments</b>\n\n team  ", 100),
            "Led payments team"
        );
    }

    #[test]
    fn test_clean_text_removes_emoji() {
        assert_eq!(clean_text("Shipped 🚀 the release ✅", 100), "Shipped the release");
    }

    #[test]
    fn test_clean_text_keeps_accents() {
        assert_eq!(clean_text("São Paulo, Brasil", 100), "São Paulo, Brasil");
    }

    #[test]
    fn test_clean_text_truncates_on_char_boundary() {
        assert_eq!(clean_text("ação ação", 6), "ação a");
        assert_eq!(clean_text("abc def", 4), "abc");
    }

    #[test]
    fn test_clean_text_blank_becomes_empty() {
        assert_eq!(clean_text(" <br/> \t ", 10), "");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let inputs = [
            "a > b < c",
            "<a <b> text",
            "  Rust   &amp; <i>Go</i> 🎉 ",
            "tail spaces after cut     xxxxxxxx",
        ];
        for input in inputs {
            let once = clean_text(input, 24);
            assert_eq!(clean_text(&once, 24), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }
}
