//! Free-text interest normalization.

use super::vocabulary::SynonymTable;

/// Canonicalize a raw interest string.
///
/// Trims, lowercases, title-cases each space-separated token, then maps the
/// result through the synonym table. `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str, synonyms: &SynonymTable) -> String {
    let titled = title_case(raw);
    match synonyms.canonical(&titled) {
        Some(canonical) => canonical.to_string(),
        None => titled,
    }
}

/// Trim, lowercase, and capitalize the first character of every token.
///
/// Tokens are split on single spaces, so runs of spaces inside the text are
/// kept as-is.
pub fn title_case(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut upper = first.to_uppercase();
    // Multi-char uppercase forms (e.g. 'ß' → "SS") would not survive a second
    // pass, so those keep their lowercase form.
    let head: String = if upper.len() == 1 {
        upper.next().map(String::from).unwrap_or_default()
    } else {
        first.to_string()
    };
    head + chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin(raw: &str) -> String {
        normalize(raw, &SynonymTable::builtin())
    }

    #[test]
    fn maps_synonyms() {
        assert_eq!(builtin("jogging"), "Running");
        assert_eq!(builtin("BIKING"), "Cycling");
        assert_eq!(builtin("  tabletop games "), "Board Games");
        assert_eq!(builtin("films"), "Movies");
    }

    #[test]
    fn title_cases_and_trims() {
        assert_eq!(builtin("  board GAMES "), "Board Games");
        assert_eq!(builtin("rock climbing"), "Rock Climbing");
        assert_eq!(builtin("pottery"), "Pottery");
    }

    #[test]
    fn keeps_inner_space_runs() {
        assert_eq!(title_case("board  games"), "Board  Games");
    }

    #[test]
    fn hyphenated_words_only_capitalize_the_first_letter() {
        assert_eq!(builtin("sci-fi"), "Sci-fi");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "jogging",
            "  board GAMES ",
            "DJ",
            "sci-FI",
            "a  b",
            "",
            "   ",
            "straße",
            "ßport",
            "Nature walks",
            "über cool",
        ];
        for input in inputs {
            let once = builtin(input);
            let twice = builtin(&once);
            assert_eq!(once, twice, "normalize not idempotent for {input:?}");
        }
    }

    #[test]
    fn whitespace_only_normalizes_to_empty() {
        assert_eq!(builtin("   "), "");
    }
}
