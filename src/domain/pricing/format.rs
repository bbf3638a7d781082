use super::value_objects::FieldValue;

pub const MONEY_DECIMALS: i32 = 2;
pub const PERCENT_DECIMALS: i32 = 1;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        // already far beyond any representable fraction
        return value;
    }
    let rounded = scaled.round() / factor;
    // -0.0 would otherwise render as "-0"
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn round_money(value: f64) -> f64 {
    round_to(value, MONEY_DECIMALS)
}

pub fn round_percent(value: f64) -> f64 {
    round_to(value, PERCENT_DECIMALS)
}

fn render(value: FieldValue, decimals: i32) -> String {
    value
        .value()
        .map(|v| round_to(v, decimals).to_string())
        .unwrap_or_default()
}

/// Money display: at most two decimals, no trailing zeros ("20", "12.5").
pub fn format_money(value: FieldValue) -> String {
    render(value, MONEY_DECIMALS)
}

/// Percentage display: at most one decimal.
pub fn format_percent(value: FieldValue) -> String {
    render(value, PERCENT_DECIMALS)
}
