//! Filename-safe normalization of titles and author names.
//!
//! `"The Information: A History, a Theory, a Flood"` becomes
//! `"The_Information-A_History_a_Theory_a_Flood"`: words joined by `_`,
//! clauses joined by `-`, no other punctuation.

use std::sync::LazyLock;

use anyhow::{Result, ensure};
use regex::Regex;

static SANITIZED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z][-0-9A-Za-z_]+[0-9A-Za-z]$").unwrap());

/// Ordered rewrite rules; each pattern is replaced everywhere before the next runs.
static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // initials: "J. K." / "J.K." -> "J K "
        (r"\b([A-Z])(\. ?| )", "${1} "),
        (r"\s*[&+]\s*", " and "),
        (r"\s*@\s*", " at "),
        // hyphenated words and contractions collapse
        (r"([A-Za-z])[-']([A-Za-z])", "${1}${2}"),
        // clause separators
        (r"\s*[!.:;?]\s*", "-"),
        (r"\s*\(([^)]*)\)\s*", "-${1}-"),
        (r"\s*\[([^\]]*)\]\s*", "-${1}-"),
        (r#"["$%',]"#, " "),
        (r"\s+", "_"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

pub fn is_sanitized(s: &str) -> bool {
    SANITIZED_RE.is_match(s)
}

/// Rewrite `s` into a filename-safe form, failing if the result is unusable
/// (for example when nothing alphanumeric survives).
pub fn sanitize(s: &str) -> Result<String> {
    let mut out = s.to_string();
    for (re, replacement) in RULES.iter() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    let out = out.trim_matches(|c: char| c.is_ascii_punctuation()).to_string();
    ensure!(is_sanitized(&out), "{s:?} failed sanitization (got {out:?})");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: &[(&[&str], &str)] = &[
        (&["J. K. Rowling", "J.K.Rowling", "J K Rowling"], "J_K_Rowling"),
        (&["Jon Kabat-Zinn"], "Jon_KabatZinn"),
        (&["And Yet..."], "And_Yet"),
        (&["Infinite Jest (Abridged)"], "Infinite_Jest-Abridged"),
        (
            &["The Information: A History, a Theory, a Flood"],
            "The_Information-A_History_a_Theory_a_Flood",
        ),
        (&["The Time Traveler's Wife"], "The_Time_Travelers_Wife"),
    ];

    #[test]
    fn expected_outputs_are_sanitized() {
        for (_, expected) in CASES {
            assert!(is_sanitized(expected), "{expected}");
        }
    }

    #[test]
    fn sanitize_known_titles() {
        for (inputs, expected) in CASES {
            for input in *inputs {
                assert_eq!(sanitize(input).expect("sanitize"), *expected, "{input}");
            }
        }
    }

    #[test]
    fn spells_out_symbols() {
        assert_eq!(sanitize("Salt & Pepper").expect("sanitize"), "Salt_and_Pepper");
        assert_eq!(sanitize("Meet @ Noon").expect("sanitize"), "Meet_at_Noon");
        assert_eq!(sanitize("Volume [Two]").expect("sanitize"), "Volume-Two");
    }

    #[test]
    fn rejects_input_without_enough_text() {
        assert!(sanitize("...").is_err());
        assert!(sanitize("").is_err());
    }

    #[test]
    fn is_sanitized_rejects_spaces_and_edges() {
        assert!(!is_sanitized("two words"));
        assert!(!is_sanitized("_leading"));
        assert!(!is_sanitized("ab"));
    }
}
