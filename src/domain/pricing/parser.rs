//! Tolerant parsing of hand-typed numbers.
//!
//! The rightmost `,` or `.` is always the decimal separator and every earlier
//! one is a thousands separator, so "1.234,56", "1,234.56" and "1 234,56" all
//! read as 1234.56.

use super::value_objects::FieldValue;

pub fn parse_loose(raw: &str) -> FieldValue {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return FieldValue::INVALID;
    }

    let normalized = match compact.rfind([',', '.']) {
        Some(sep) => {
            let int_part: String = compact[..sep]
                .chars()
                .filter(|c| *c != ',' && *c != '.')
                .collect();
            // separators are ASCII, so `sep + 1` is a char boundary
            format!("{}.{}", int_part, &compact[sep + 1..])
        }
        None => compact
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '-')
            .collect(),
    };

    if matches!(normalized.as_str(), "" | "-" | "+") {
        return FieldValue::INVALID;
    }

    normalized
        .parse::<f64>()
        .map(FieldValue::new)
        .unwrap_or(FieldValue::INVALID)
}
