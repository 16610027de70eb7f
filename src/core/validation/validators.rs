//! Field validators for order forms
//!
//! Pure functions with no I/O. Each one answers "is this value acceptable"
//! for a single field; [`super::ValidationReport`] collects the answers.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Order types accepted by the Record API
pub const ORDER_TYPES: [&str; 3] = ["OPORD", "FRAGO", "WARNO"];

/// Placeholder shown in the order type select before a choice is made
pub const ORDER_TYPE_PLACEHOLDER: &str = "SELECT ONE";

/// File extensions the upload form accepts
pub const FILE_EXTENSIONS: [&str; 2] = [".pdf", ".docx"];

static FISCAL_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^FY\d{2}$").expect("fiscal year pattern"));

static ORDER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{3}$").expect("order number pattern"));

/// `FY` followed by exactly two digits, case-insensitive
pub fn is_valid_fiscal_year(s: &str) -> bool {
    FISCAL_YEAR.is_match(s)
}

/// One of `OPORD`, `FRAGO`, `WARNO`
///
/// The select placeholder never matches.
pub fn is_valid_order_type(s: &str) -> bool {
    ORDER_TYPES.contains(&s)
}

/// Two digits, a hyphen, three digits (`25-001`)
pub fn is_valid_order_number(s: &str) -> bool {
    ORDER_NUMBER.is_match(s)
}

/// Calendar date in `YYYY-MM-DD`
pub fn is_valid_order_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Non-empty after trimming
pub fn is_valid_title(s: &str) -> bool {
    !s.trim().is_empty()
}

/// A file is present and its name ends in `.pdf` or `.docx`, any case
pub fn is_valid_file(name: Option<&str>) -> bool {
    let Some(name) = name else {
        return false;
    };
    let lower = name.to_ascii_lowercase();
    FILE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Uppercase the first character of every word
///
/// Word characters are ASCII letters, digits and `_`; a word starts at a
/// word character that follows a non-word character or the start of the
/// string. Everything else is left untouched, so the function is idempotent.
pub fn normalize_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !in_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        in_word = is_word;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // === is_valid_fiscal_year() ===

    #[test]
    fn test_fiscal_year_accepts_every_two_digit_year() {
        for year in 0..100 {
            assert!(is_valid_fiscal_year(&format!("FY{:02}", year)));
            assert!(is_valid_fiscal_year(&format!("fy{:02}", year)));
            assert!(is_valid_fiscal_year(&format!("Fy{:02}", year)));
        }
    }

    #[test]
    fn test_fiscal_year_rejects_other_shapes() {
        for bad in ["", "FY", "FY1", "FY123", "FX25", " FY25", "FY25 ", "2025", "FY2a"] {
            assert!(!is_valid_fiscal_year(bad), "{bad:?} should be rejected");
        }
    }

    // === is_valid_order_type() ===

    #[test]
    fn test_order_type_accepts_known_types() {
        for t in ORDER_TYPES {
            assert!(is_valid_order_type(t));
        }
    }

    #[test]
    fn test_order_type_rejects_placeholder_and_unknown() {
        assert!(!is_valid_order_type(ORDER_TYPE_PLACEHOLDER));
        assert!(!is_valid_order_type("ANNEX"));
        assert!(!is_valid_order_type(""));
    }

    // === is_valid_order_number() ===

    #[test]
    fn test_order_number_examples() {
        assert!(is_valid_order_number("25-001"));
        assert!(!is_valid_order_number("25001"));
        assert!(!is_valid_order_number("2-5001"));
        assert!(!is_valid_order_number("25-0001"));
        assert!(!is_valid_order_number("ab-cde"));
    }

    // === is_valid_order_date() ===

    #[test]
    fn test_order_date_requires_iso_calendar_date() {
        assert!(is_valid_order_date("2025-03-14"));
        assert!(!is_valid_order_date(""));
        assert!(!is_valid_order_date("14/03/2025"));
        assert!(!is_valid_order_date("2025-02-30"));
    }

    // === is_valid_title() ===

    #[test]
    fn test_title_must_have_content() {
        assert!(is_valid_title("Operation Plan"));
        assert!(is_valid_title("  x  "));
        assert!(!is_valid_title(""));
        assert!(!is_valid_title(" \t\n"));
    }

    // === is_valid_file() ===

    #[test]
    fn test_file_extension_whitelist() {
        assert!(is_valid_file(Some("plan.pdf")));
        assert!(is_valid_file(Some("PLAN.PDF")));
        assert!(is_valid_file(Some("annex.Docx")));
        assert!(!is_valid_file(Some("plan.doc")));
        assert!(!is_valid_file(Some("pdf")));
        assert!(!is_valid_file(None));
    }

    // === normalize_title() ===

    #[test]
    fn test_normalize_title_capitalizes_words() {
        assert_eq!(normalize_title("operation dawn"), "Operation Dawn");
        assert_eq!(normalize_title("move-to-contact"), "Move-To-Contact");
        assert_eq!(normalize_title("phase 2a plan"), "Phase 2a Plan");
        assert_eq!(normalize_title("ALREADY UPPER"), "ALREADY UPPER");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_normalize_title_is_idempotent() {
        let samples = [
            "operation dawn",
            "  leading spaces",
            "o'neil's order",
            "snake_case words",
            "été opération",
            "x-ray/yankee.zulu",
            "123abc def",
        ];
        for s in samples {
            let once = normalize_title(s);
            assert_eq!(normalize_title(&once), once, "not idempotent for {s:?}");
        }
    }
}
