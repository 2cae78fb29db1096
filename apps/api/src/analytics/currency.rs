//! Free-text currency amounts ("$1,234.56", "~5k USD", "TBD").

/// Extracts a number from a free-text amount.
///
/// Everything except digits and `.` is discarded, then the longest numeric
/// prefix is read (a second `.` ends it). Returns `None` when no digits remain;
/// callers treat that as contributing nothing.
pub fn parse_currency_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let numeric = match cleaned.match_indices('.').nth(1) {
        Some((idx, _)) => &cleaned[..idx],
        None => cleaned.as_str(),
    };

    if !numeric.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    numeric.parse::<f64>().ok()
}

/// Renders a total as `$1,234.5`: grouped thousands, up to three decimals,
/// trailing zeros trimmed. Zero renders as `$0`.
pub fn format_currency_total(total: f64) -> String {
    if total == 0.0 || !total.is_finite() {
        return "$0".to_string();
    }

    let fixed = format!("{:.3}", total.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');
    let sign = if total < 0.0 { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{sign}${}", group_thousands(int_part))
    } else {
        format!("{sign}${}.{frac_part}", group_thousands(int_part))
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formatted_amount() {
        assert_eq!(parse_currency_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_currency_amount("500"), Some(500.0));
        assert_eq!(parse_currency_amount("$5k"), Some(5.0));
    }

    #[test]
    fn test_parse_unparseable_is_none() {
        assert_eq!(parse_currency_amount("TBD"), None);
        assert_eq!(parse_currency_amount(""), None);
        assert_eq!(parse_currency_amount("..."), None);
    }

    #[test]
    fn test_parse_stops_at_second_decimal_point() {
        assert_eq!(parse_currency_amount("v1.2 to 3.4"), Some(1.23));
        assert_eq!(parse_currency_amount("approx. 300"), Some(0.3));
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_currency_total(0.0), "$0");
    }

    #[test]
    fn test_format_groups_and_trims() {
        assert_eq!(format_currency_total(1234.5), "$1,234.5");
        assert_eq!(format_currency_total(500.0), "$500");
        assert_eq!(format_currency_total(1_000_000.0), "$1,000,000");
        assert_eq!(format_currency_total(12_345.678), "$12,345.678");
        assert_eq!(format_currency_total(999.9999), "$1,000");
    }
}
