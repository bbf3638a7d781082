use serde::{Deserialize, Serialize};

use crate::domain::pricing::{Field, Mode};

/// The four inputs exactly as displayed, partial typing included.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PanelFields {
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub price: String,
    #[serde(rename = "kate", default)]
    pub margin: String,
    #[serde(default)]
    pub markup: String,
}

impl PanelFields {
    pub fn new(cost: &str, price: &str, margin: &str, markup: &str) -> Self {
        Self {
            cost: cost.to_string(),
            price: price.to_string(),
            margin: margin.to_string(),
            markup: markup.to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Cost => &self.cost,
            Field::Price => &self.price,
            Field::Margin => &self.margin,
            Field::Markup => &self.markup,
        }
    }

    pub fn set(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Cost => &mut self.cost,
            Field::Price => &mut self.price,
            Field::Margin => &mut self.margin,
            Field::Markup => &mut self.markup,
        };
        value.clone_into(slot);
    }
}

/// Persisted form: active tab plus the raw field texts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PanelState {
    #[serde(default)]
    pub mode: Mode,
    #[serde(flatten)]
    pub fields: PanelFields,
}

impl PanelState {
    pub fn new(mode: Mode, fields: PanelFields) -> Self {
        Self { mode, fields }
    }
}

/// Top-left corner of the panel in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelPosition {
    pub left: f64,
    pub top: f64,
}

impl PanelPosition {
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }

    /// Keep the whole panel on screen, `slack` pixels away from the right and
    /// bottom edges. A panel larger than the viewport pins to the top-left.
    pub fn clamp_to(&self, panel: Size, viewport: Size, slack: f64) -> Self {
        let max_left = (viewport.width - panel.width - slack).max(0.0);
        let max_top = (viewport.height - panel.height - slack).max(0.0);
        Self {
            left: self.left.max(0.0).min(max_left),
            top: self.top.max(0.0).min(max_top),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}
