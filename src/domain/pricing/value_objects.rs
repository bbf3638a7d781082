use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

use super::parser::parse_loose;

/// A parsed numeric field. `None` is the invalid marker: empty, malformed or
/// non-finite input. Any arithmetic touching an invalid operand stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldValue(Option<f64>);

impl FieldValue {
    pub const INVALID: FieldValue = FieldValue(None);

    /// Wraps a computed number, turning NaN and infinities into the marker.
    pub fn new(value: f64) -> Self {
        if value.is_finite() { Self(Some(value)) } else { Self::INVALID }
    }

    pub fn parse(raw: &str) -> Self {
        parse_loose(raw)
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// The value when it is finite and strictly positive.
    pub fn positive(&self) -> Option<f64> {
        self.0.filter(|v| *v > 0.0)
    }

    /// The value when it is finite and non-zero (usable as a divisor).
    pub fn non_zero(&self) -> Option<f64> {
        self.0.filter(|v| *v != 0.0)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map(FieldValue::new).unwrap_or(FieldValue::INVALID)
    }
}

/// Which percentage drives the sale price.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, StrumDisplay, EnumIter, EnumString, AsRefStr,
    Serialize, Deserialize,
)]
pub enum Mode {
    /// Kate: share of the sale price that is profit.
    #[default]
    #[strum(serialize = "kate")]
    #[serde(rename = "kate")]
    Margin,
    /// Lisäys: percentage added on top of cost.
    #[strum(serialize = "markup")]
    #[serde(rename = "markup")]
    Markup,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Margin => "Margin",
            Mode::Markup => "Markup",
        }
    }

    /// The input field holding this mode's percentage.
    pub fn percent_field(&self) -> Field {
        match self {
            Mode::Margin => Field::Margin,
            Mode::Markup => Field::Markup,
        }
    }
}

/// The four editable inputs of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, EnumString, AsRefStr)]
pub enum Field {
    #[strum(serialize = "cost")]
    Cost,
    #[strum(serialize = "price")]
    Price,
    #[strum(serialize = "kate")]
    Margin,
    #[strum(serialize = "markup")]
    Markup,
}

impl Field {
    /// Tag recorded when the user types into this field.
    pub fn edit_tag(&self) -> LastEdited {
        match self {
            Field::Cost => LastEdited::Cost,
            Field::Price => LastEdited::Price,
            Field::Margin | Field::Markup => LastEdited::Percent,
        }
    }
}

/// Which field the user touched last; picks the computation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastEdited {
    #[default]
    None,
    Cost,
    Price,
    Percent,
}
