//! ISBN helpers.

use std::sync::LazyLock;

use anyhow::{Result, ensure};
use regex::Regex;

/// Optional 3-digit prefix, 9 digits, then a digit or `X` check character.
/// ASCII digits only.
pub const ISBN_PATTERN: &str = r"^([0-9]{3})?[0-9]{9}[0-9X]$";

static ISBN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(ISBN_PATTERN).unwrap());

pub fn is_isbn(s: &str) -> bool {
    ISBN_RE.is_match(s)
}

/// Convert an ISBN-13 to ISBN-10.
///
/// Only the shape of the input is checked; its own check digit is ignored.
pub fn isbn13_to_10(isbn13: &str) -> Result<String> {
    ensure!(
        isbn13.len() == 13 && is_isbn(isbn13),
        "{isbn13:?} is not an ISBN-13"
    );
    let isbn9 = &isbn13[3..12];
    let checksum: u32 = (2..=10u32)
        .rev()
        .zip(isbn9.bytes())
        .map(|(weight, digit)| weight * u32::from(digit - b'0'))
        .sum();
    let check = match 11 - checksum % 11 {
        10 => "X".to_string(),
        11 => "0".to_string(),
        n => n.to_string(),
    };
    Ok(format!("{isbn9}{check}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_accepts_both_lengths() {
        assert!(is_isbn("9780306406157"));
        assert!(is_isbn("030640615X"));
        assert!(!is_isbn("97803064061"));
        assert!(!is_isbn("978-0-306-40615-7"));
    }

    #[test]
    fn converts_known_isbns() {
        assert_eq!(isbn13_to_10("9780306406157").expect("convert"), "0306406152");
        assert_eq!(isbn13_to_10("9780131103627").expect("convert"), "0131103628");
    }

    #[test]
    fn check_digit_ten_renders_as_x() {
        assert_eq!(isbn13_to_10("9780000000060").expect("convert"), "000000006X");
    }

    #[test]
    fn check_digit_eleven_renders_as_zero() {
        assert_eq!(isbn13_to_10("9780000000000").expect("convert"), "0000000000");
    }

    #[test]
    fn rejects_non_ascii_digits() {
        let arabic_indic = "\u{660}\u{660}\u{660}0000000";
        assert!(!is_isbn(arabic_indic));
        assert!(isbn13_to_10(arabic_indic).is_err());
        assert!(isbn13_to_10("978\u{0663}00000000").is_err());
    }

    #[test]
    fn rejects_isbn10_input() {
        assert!(isbn13_to_10("0306406152").is_err());
    }
}
