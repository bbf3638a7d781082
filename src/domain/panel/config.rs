use serde::{Deserialize, Serialize};

use super::entities::PanelPosition;

/// Tunables of the panel. Every field has a default, so the shell may pass
/// any subset as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    /// Most entries kept in the history list.
    pub history_capacity: usize,
    /// Cost/price distance under which two history entries are the same.
    pub money_epsilon: f64,
    pub default_position: PanelPosition,
    /// Gap kept between the panel and the right/bottom viewport edges.
    pub viewport_slack: f64,
    /// Percentage text shown when no state was persisted.
    pub default_percent: String,
    pub copied_toast: String,
    pub position_reset_toast: String,
    pub history_cleared_toast: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            history_capacity: 20,
            money_epsilon: 0.005,
            default_position: PanelPosition::new(24.0, 24.0),
            viewport_slack: 4.0,
            default_percent: "99".to_string(),
            copied_toast: "Copied".to_string(),
            position_reset_toast: "Position reset".to_string(),
            history_cleared_toast: "History cleared".to_string(),
        }
    }
}
