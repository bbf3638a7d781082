use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use strum::{AsRefStr, Display as StrumDisplay};

use crate::domain::logging::TimeProvider;
use crate::domain::panel::{PanelFields, PanelState};
use crate::domain::pricing::{
    FieldValue, Mode, format_money, format_percent, margin_of, markup_of, round_money,
    round_percent,
};

/// One saved computation, rounded at capture time. Field names follow the
/// stored format of earlier releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "t")]
    pub timestamp: u64,
    pub mode: Mode,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(rename = "kate", default)]
    pub margin: Option<f64>,
    #[serde(default)]
    pub markup: Option<f64>,
}

impl HistoryEntry {
    /// Snapshot the panel. Needs a valid cost and a positive price.
    pub fn capture(mode: Mode, fields: &PanelFields, timestamp: u64) -> Option<Self> {
        let cost = FieldValue::parse(&fields.cost);
        let price = FieldValue::parse(&fields.price);
        let c = cost.value()?;
        let p = price.positive()?;

        Some(Self {
            timestamp,
            mode,
            cost: Some(round_money(c)),
            price: Some(round_money(p)),
            margin: margin_of(cost, price).value().map(round_percent),
            markup: markup_of(cost, price).value().map(round_percent),
        })
    }

    /// Same mode and cost/price each within `epsilon`.
    pub fn is_near_duplicate(&self, other: &HistoryEntry, epsilon: f64) -> bool {
        fn near(a: Option<f64>, b: Option<f64>, epsilon: f64) -> bool {
            matches!((a, b), (Some(a), Some(b)) if (a - b).abs() <= epsilon)
        }
        self.mode == other.mode
            && near(self.cost, other.cost, epsilon)
            && near(self.price, other.price, epsilon)
    }

    /// Field texts to load when the entry is picked from the list.
    pub fn to_state(&self) -> PanelState {
        PanelState::new(
            self.mode,
            PanelFields {
                cost: format_money(self.cost.into()),
                price: format_money(self.price.into()),
                margin: format_percent(self.margin.into()),
                markup: format_percent(self.markup.into()),
            },
        )
    }

    pub fn headline(&self) -> String {
        format!(
            "{} • C €{} → P €{}",
            self.mode.label(),
            format_money(self.cost.into()),
            format_money(self.price.into())
        )
    }

    pub fn meta_line(&self, clock: &dyn TimeProvider) -> String {
        format!(
            "Margin {} % • Markup {} % • {}",
            format_percent(self.margin.into()),
            format_percent(self.markup.into()),
            clock.format_timestamp(self.timestamp)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AppendOutcome {
    Inserted,
    /// Head of the list already holds the same computation.
    Duplicate,
    /// Cost or price was not usable.
    Rejected,
}

/// Bounded most-recent-first list of entries.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    epsilon: f64,
}

impl HistoryLog {
    pub fn new(capacity: usize, epsilon: f64) -> Self {
        Self { entries: VecDeque::new(), capacity, epsilon }
    }

    pub fn from_entries(entries: Vec<HistoryEntry>, capacity: usize, epsilon: f64) -> Self {
        let mut entries = VecDeque::from(entries);
        entries.truncate(capacity);
        Self { entries, capacity, epsilon }
    }

    pub fn push(&mut self, entry: HistoryEntry) -> AppendOutcome {
        if let Some(head) = self.entries.front() {
            if head.is_near_duplicate(&entry, self.epsilon) {
                return AppendOutcome::Duplicate;
            }
        }

        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        AppendOutcome::Inserted
    }

    pub fn remove(&mut self, index: usize) -> Option<HistoryEntry> {
        self.entries.remove(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn head(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}
