/// Keeps only ASCII digits and decimal points from raw OCR output.
pub fn filter_reading_chars(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Parses OCR output into a weight.
///
/// Returns `None` for anything that is not a single decimal number once
/// stray characters are removed: empty text, a lone `.`, or several points.
pub fn parse_reading(text: &str) -> Option<f64> {
    filter_reading_chars(text).parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_reading_chars() {
        assert_eq!(filter_reading_chars("12.34\n\x0c"), "12.34");
        assert_eq!(filter_reading_chars(" 7 . 5 kg"), "7.5");
        assert_eq!(filter_reading_chars("abc"), "");
    }

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_reading("12.32"), Some(12.32));
        assert_eq!(parse_reading("0.85\n"), Some(0.85));
        assert_eq!(parse_reading("70"), Some(70.0));
    }

    #[test]
    fn test_parse_strips_noise() {
        assert_eq!(parse_reading("W: 64.10 kg"), Some(64.10));
        assert_eq!(parse_reading("|5.0|"), Some(5.0));
    }

    #[test]
    fn test_parse_failures_are_absent() {
        assert_eq!(parse_reading(""), None);
        assert_eq!(parse_reading("\n"), None);
        assert_eq!(parse_reading("."), None);
        assert_eq!(parse_reading("1.2.3"), None);
        assert_eq!(parse_reading("kg"), None);
    }

    #[test]
    fn test_parse_ignores_sign_and_exponent_letters() {
        // '-' and 'e' are filtered out before parsing
        assert_eq!(parse_reading("-3.5"), Some(3.5));
        assert_eq!(parse_reading("1e3"), Some(13.0));
    }
}
