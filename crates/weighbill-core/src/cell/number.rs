//! Number parsing for entered text

use lazy_regex::regex_is_match;

/// Parse text made only of digits, at most one decimal point and comma
/// thousands separators (e.g. `"1,234.50"`).
///
/// This is the coercion applied to literal cells on export: anything with a
/// sign, exponent, whitespace or letters stays text.
pub fn parse_grouped_number(text: &str) -> Option<f64> {
    let stripped = text.replace(',', "");
    if !regex_is_match!(r"^(?:[0-9]+\.?[0-9]*|\.[0-9]+)$", &stripped) {
        return None;
    }
    stripped.parse().ok()
}

/// Parse text as a decimal number after stripping comma separators.
///
/// More lenient than [`parse_grouped_number`]: signs, exponents and
/// surrounding whitespace are accepted. Used by entry validation.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let stripped = text.trim().replace(',', "");
    if stripped.is_empty() {
        return None;
    }
    stripped.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_numbers() {
        assert_eq!(parse_grouped_number("1,234.50"), Some(1234.5));
        assert_eq!(parse_grouped_number("42"), Some(42.0));
        assert_eq!(parse_grouped_number("12."), Some(12.0));
        assert_eq!(parse_grouped_number(".5"), Some(0.5));
        assert_eq!(parse_grouped_number("1,00,000"), Some(100000.0));
    }

    #[test]
    fn test_grouped_rejects_non_numeric() {
        assert_eq!(parse_grouped_number("ABC123"), None);
        assert_eq!(parse_grouped_number(""), None);
        assert_eq!(parse_grouped_number(","), None);
        assert_eq!(parse_grouped_number("1.2.3"), None);
        assert_eq!(parse_grouped_number("-5"), None);
        assert_eq!(parse_grouped_number(" 5"), None);
        assert_eq!(parse_grouped_number("31/12/2024"), None);
    }

    #[test]
    fn test_decimal() {
        assert_eq!(parse_decimal(" 1,250.5 "), Some(1250.5));
        assert_eq!(parse_decimal("-3"), Some(-3.0));
        assert_eq!(parse_decimal("2e2"), Some(200.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("ten"), None);
    }
}
