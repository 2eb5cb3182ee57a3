//! Locale-aware decimal parsing and formatting for weight values.
//!
//! Scale and ERP exports write weights every way imaginable: `20,000 kg`,
//! `1,234.5`, `1.234,5`, `15.5`. [`parse_decimal`] decides which separator
//! is the decimal one from the string itself.

use serde::{Deserialize, Serialize};

/// Separators for formatted numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberLocale {
    pub decimal: char,
    pub group: char,
    /// Integer parts shorter than this are written without grouping.
    pub group_min_digits: usize,
}

impl NumberLocale {
    /// Spanish: `1234,50` but `12.345,50`.
    pub const ES: Self = Self {
        decimal: ',',
        group: '.',
        group_min_digits: 5,
    };

    /// English: `1,234.50`.
    pub const EN: Self = Self {
        decimal: '.',
        group: ',',
        group_min_digits: 4,
    };
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self::ES
    }
}

/// Parse a human-written decimal, ignoring units and spaces.
///
/// - both `,` and `.` present: the last one is the decimal separator;
/// - one kind present once: it is the decimal separator;
/// - one kind repeated: it is grouping.
///
/// Returns `None` when no digits are found.
pub fn parse_decimal(input: &str) -> Option<f64> {
    let negative = input.trim_start().starts_with('-');
    let kept: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let commas = kept.matches(',').count();
    let dots = kept.matches('.').count();
    let decimal = match (commas, dots) {
        (0, 0) => None,
        (c, d) if c > 0 && d > 0 => {
            let last_comma = kept.rfind(',');
            let last_dot = kept.rfind('.');
            if last_comma > last_dot { Some(',') } else { Some('.') }
        }
        (1, 0) => Some(','),
        (0, 1) => Some('.'),
        _ => None,
    };

    let mut normalized = String::with_capacity(kept.len() + 1);
    if negative {
        normalized.push('-');
    }
    for c in kept.chars() {
        match c {
            '0'..='9' => normalized.push(c),
            sep if Some(sep) == decimal => normalized.push('.'),
            _ => {}
        }
    }
    normalized.parse().ok()
}

/// Format with a fixed number of decimals and locale separators.
pub fn format_grouped(value: f64, decimals: usize, locale: &NumberLocale) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    if int_part.len() >= locale.group_min_digits {
        let len = int_part.len();
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                out.push(locale.group);
            }
            out.push(c);
        }
    } else {
        out.push_str(int_part);
    }
    if let Some(frac) = frac_part {
        out.push(locale.decimal);
        out.push_str(frac);
    }
    out
}

/// `round(value * 100)` zero-padded to at least six digits.
///
/// Values of 10000 or more produce longer strings; nothing is truncated.
pub fn six_digits(value: f64) -> String {
    let hundredths = (value * 100.0).round() as i64;
    format!("{:06}", hundredths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_separator_is_decimal() {
        assert_eq!(parse_decimal("20,000 kg"), Some(20.0));
        assert_eq!(parse_decimal("15,500 kg"), Some(15.5));
        assert_eq!(parse_decimal("15.5"), Some(15.5));
        assert_eq!(parse_decimal("  7 kg"), Some(7.0));
    }

    #[test]
    fn test_parse_mixed_separators() {
        assert_eq!(parse_decimal("1,234.5"), Some(1234.5));
        assert_eq!(parse_decimal("1.234,5"), Some(1234.5));
        assert_eq!(parse_decimal("1.234.567,25"), Some(1234567.25));
    }

    #[test]
    fn test_parse_repeated_separator_is_grouping() {
        assert_eq!(parse_decimal("1.234.567"), Some(1234567.0));
        assert_eq!(parse_decimal("1,234,567"), Some(1234567.0));
    }

    #[test]
    fn test_parse_rejects_no_digits() {
        assert_eq!(parse_decimal("kg"), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("-"), None);
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(parse_decimal("-2,5"), Some(-2.5));
    }

    #[test]
    fn test_format_grouped_es() {
        let es = NumberLocale::ES;
        assert_eq!(format_grouped(15.5, 2, &es), "15,50");
        assert_eq!(format_grouped(1234.5, 2, &es), "1234,50");
        assert_eq!(format_grouped(12345.678, 2, &es), "12.345,68");
        assert_eq!(format_grouped(1234567.0, 0, &es), "1.234.567");
    }

    #[test]
    fn test_format_grouped_en() {
        assert_eq!(format_grouped(1234.5, 2, &NumberLocale::EN), "1,234.50");
        assert_eq!(format_grouped(-0.001, 2, &NumberLocale::EN), "0.00");
    }

    #[test]
    fn test_six_digits() {
        assert_eq!(six_digits(20.0), "002000");
        assert_eq!(six_digits(1234.5), "123450");
        assert_eq!(six_digits(0.125), "000013");
        assert_eq!(six_digits(12345.67), "1234567");
    }
}
