//! Heuristics for pulling a title and description out of generated text.

const TITLE_PREFIX: &str = "title:";

/// Keep ASCII letters and digits, whitespace and `. , ! ?`, then collapse
/// whitespace runs into single spaces.
pub fn clean_text(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '.' | ',' | '!' | '?')
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The cleaned value of the first `Title:` line, or the cleaned first line
/// when the model ignored the requested format.
pub fn extract_title(text: &str) -> String {
    for line in text.split('\n') {
        let has_prefix = line
            .get(..TITLE_PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(TITLE_PREFIX));
        if has_prefix {
            return clean_text(line[TITLE_PREFIX.len()..].trim());
        }
    }
    text.split('\n').next().map(clean_text).unwrap_or_default()
}

/// Everything after the first line, trimmed but otherwise untouched.
pub fn derive_description(text: &str) -> String {
    match text.split_once('\n') {
        Some((_, rest)) => rest.trim().to_string(),
        None => String::new(),
    }
}

/// First `max_chars` characters of `text`, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_line_prefix_is_dropped_before_cleaning() {
        let text = "Title: A Nice House!\nSpacious 3BR.";
        assert_eq!(extract_title(text), "A Nice House!");
    }

    #[test]
    fn title_prefix_is_case_insensitive_and_need_not_be_first() {
        let text = "Sure, here you go:\nTITLE: **Sunlit Loft** near 5th Ave.\nMore text";
        assert_eq!(extract_title(text), "Sunlit Loft near 5th Ave.");
    }

    #[test]
    fn indented_title_line_is_not_recognised() {
        let text = "Great find\n  Title: Ignored";
        assert_eq!(extract_title(text), "Great find");
    }

    #[test]
    fn falls_back_to_first_line() {
        assert_eq!(extract_title("Lovely cottage\nNear the lake"), "Lovely cottage");
    }

    #[test]
    fn empty_text_gives_empty_title() {
        assert_eq!(extract_title(""), "");
        assert_eq!(extract_title("\n\n"), "");
    }

    #[test]
    fn cleaned_output_uses_only_allowed_characters() {
        let samples = [
            "Title: Café — “Château” @ 50% off!!",
            "Cozy\t\tstudio   #42 (renovated) ~ 3 mins → beach",
            "Title:\u{00a0}Ocean\u{2003}View; pool & spa?",
            "🏠 Modern home, 4BR/3BA.",
        ];
        for sample in samples {
            let title = extract_title(sample);
            assert!(
                title
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | ',' | '!' | '?')),
                "unexpected character in {:?}",
                title
            );
            assert!(!title.contains("  "));
            assert_eq!(title.trim(), title);
        }
    }

    #[test]
    fn clean_text_collapses_unicode_whitespace() {
        assert_eq!(clean_text("Ocean\u{2003}\u{00a0}View;  pool"), "Ocean View pool");
    }

    #[test]
    fn description_is_everything_after_first_line() {
        let text = "Title: Loft\n\nBright open plan.\nWalk to transit.\n";
        assert_eq!(derive_description(text), "Bright open plan.\nWalk to transit.");
        assert_eq!(derive_description("Only a title"), "");
        assert_eq!(derive_description(""), "");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 500), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
