use std::fmt;

use crate::domain::errors::PricingError;
use crate::domain::panel::PanelFields;

use super::format::{format_money, format_percent};
use super::value_objects::{Field, FieldValue, LastEdited, Mode};

/// Margin % of `price` given `cost`: 100·(price−cost)/price. Needs price > 0.
pub fn margin_of(cost: FieldValue, price: FieldValue) -> FieldValue {
    match (cost.value(), price.positive()) {
        (Some(c), Some(p)) => FieldValue::new(100.0 * (p - c) / p),
        _ => FieldValue::INVALID,
    }
}

/// Markup % of `price` over `cost`: 100·(price/cost − 1). Needs cost ≠ 0.
pub fn markup_of(cost: FieldValue, price: FieldValue) -> FieldValue {
    match (cost.non_zero(), price.value()) {
        (Some(c), Some(p)) => FieldValue::new(100.0 * (p / c - 1.0)),
        _ => FieldValue::INVALID,
    }
}

/// Price reaching `margin` % on `cost`. Margins of 100 and above have no
/// finite positive price.
pub fn price_from_margin(cost: FieldValue, margin: FieldValue) -> Result<FieldValue, PricingError> {
    match (cost.value(), margin.value()) {
        (_, Some(m)) if m >= 100.0 => Err(PricingError::MarginOutOfRange),
        (Some(c), Some(m)) => Ok(FieldValue::new(c / (1.0 - m / 100.0))),
        _ => Ok(FieldValue::INVALID),
    }
}

/// Price adding `markup` % on top of `cost`. Unbounded; the lower limit of
/// −100 % is an input constraint of the view, not checked here.
pub fn price_from_markup(cost: FieldValue, markup: FieldValue) -> FieldValue {
    match (cost.value(), markup.value()) {
        (Some(c), Some(m)) => FieldValue::new(c * (1.0 + m / 100.0)),
        _ => FieldValue::INVALID,
    }
}

/// Display strings the engine wants written back into the panel. `None`
/// leaves the field as the user typed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    pub price: Option<String>,
    pub margin: Option<String>,
    pub markup: Option<String>,
}

impl FieldUpdates {
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.margin.is_none() && self.markup.is_none()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Cost => None,
            Field::Price => self.price.as_deref(),
            Field::Margin => self.margin.as_deref(),
            Field::Markup => self.markup.as_deref(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        [Field::Price, Field::Margin, Field::Markup]
            .into_iter()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }
}

/// A domain error pinned to the input it concerns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldError {
    pub field: Field,
    pub error: PricingError,
}

/// Read-only margin/markup recomputed from cost and price, whatever the mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedLine {
    Unavailable,
    Available { margin: FieldValue, markup: FieldValue },
}

impl DerivedLine {
    pub fn from_values(cost: FieldValue, price: FieldValue) -> Self {
        if cost.is_valid() && price.positive().is_some() {
            DerivedLine::Available {
                margin: margin_of(cost, price),
                markup: markup_of(cost, price),
            }
        } else {
            DerivedLine::Unavailable
        }
    }

    pub fn margin(&self) -> Option<f64> {
        match self {
            DerivedLine::Available { margin, .. } => margin.value(),
            DerivedLine::Unavailable => None,
        }
    }

    pub fn markup(&self) -> Option<f64> {
        match self {
            DerivedLine::Available { markup, .. } => markup.value(),
            DerivedLine::Unavailable => None,
        }
    }
}

const PLACEHOLDER: &str = "—";

fn percent_or_placeholder(value: FieldValue) -> String {
    if value.is_valid() { format_percent(value) } else { PLACEHOLDER.to_string() }
}

impl fmt::Display for DerivedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedLine::Unavailable => write!(f, "Derived: {}", PLACEHOLDER),
            DerivedLine::Available { margin, markup } => write!(
                f,
                "Derived: Margin {} % • Markup {} %",
                percent_or_placeholder(*margin),
                percent_or_placeholder(*markup)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Computation {
    pub updates: FieldUpdates,
    pub error: Option<FieldError>,
    pub derived: DerivedLine,
}

/// Pure cost/price/percentage solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

impl PricingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decide what the other fields become after `last_edited` changed.
    ///
    /// A price edit solves for the active mode's percentage; anything else
    /// solves for price from cost and the active percentage. The derived line
    /// is computed from the fields as they read after the write-back.
    pub fn compute(&self, fields: &PanelFields, mode: Mode, last_edited: LastEdited) -> Computation {
        let cost = FieldValue::parse(&fields.cost);
        let price = FieldValue::parse(&fields.price);

        let mut updates = FieldUpdates::default();
        let mut error = None;

        if last_edited == LastEdited::Price {
            if price.positive().is_some() && cost.is_valid() {
                match mode {
                    Mode::Margin => updates.margin = Some(format_percent(margin_of(cost, price))),
                    Mode::Markup => updates.markup = Some(format_percent(markup_of(cost, price))),
                }
            }
        } else if cost.is_valid() {
            let percent_field = mode.percent_field();
            let percent = FieldValue::parse(fields.get(percent_field));
            if percent.is_valid() {
                let solved = match mode {
                    Mode::Margin => price_from_margin(cost, percent),
                    Mode::Markup => Ok(price_from_markup(cost, percent)),
                };
                match solved {
                    Ok(price) => updates.price = Some(format_money(price)),
                    Err(e) => {
                        error = Some(FieldError { field: percent_field, error: e });
                        updates.price = Some(String::new());
                    }
                }
            }
        }

        let shown_price = updates
            .price
            .as_deref()
            .map(FieldValue::parse)
            .unwrap_or(price);

        Computation {
            derived: DerivedLine::from_values(cost, shown_price),
            updates,
            error,
        }
    }
}
