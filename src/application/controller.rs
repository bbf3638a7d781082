use serde::Serialize;
use std::rc::Rc;

use crate::application::echo_guard::EchoGuard;
use crate::application::history_ledger::HistoryLedger;
use crate::domain::{
    history::{AppendOutcome, HistoryEntry},
    logging::{LogComponent, get_time_provider},
    panel::{Clipboard, DurableBackend, PanelConfig, PanelFields, PanelPosition, PanelState, Size},
    pricing::{Computation, DerivedLine, Field, FieldError, FieldValue, LastEdited, Mode, PricingEngine},
};
use crate::infrastructure::storage::{PersistentStore, StorePatch};

/// Text shown instead of rows when nothing has been saved.
pub const EMPTY_HISTORY_TEXT: &str = "No entries.";

/// One rendered line of the history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub index: usize,
    /// 1-based position label, `#1` is the newest.
    pub label: String,
    pub headline: String,
    pub meta: String,
}

impl HistoryRow {
    fn new(index: usize, entry: &HistoryEntry) -> Self {
        Self {
            index,
            label: format!("#{}", index + 1),
            headline: entry.headline(),
            meta: entry.meta_line(get_time_provider()),
        }
    }
}

/// What the controller asks of the DOM shell. Implementations only display;
/// they never call back into the controller synchronously.
pub trait PanelView {
    fn set_field(&self, field: Field, value: &str);
    fn set_mode(&self, mode: Mode);
    /// `None` clears the message under `field`.
    fn set_error(&self, field: Field, message: Option<&str>);
    fn set_derived(&self, text: &str);
    fn set_position(&self, position: PanelPosition);
    /// Empty `rows` means the list shows [`EMPTY_HISTORY_TEXT`].
    fn render_history(&self, rows: &[HistoryRow]);
    fn set_history_visible(&self, visible: bool);
    fn show_toast(&self, message: &str);
    fn unmount(&self);
}

/// Coordinates one open panel: routes edits through the solver, writes the
/// results back without echo, and keeps storage in step.
pub struct PanelController<B: DurableBackend, V: PanelView> {
    engine: PricingEngine,
    store: Rc<PersistentStore<B>>,
    ledger: HistoryLedger<B>,
    view: V,
    guard: EchoGuard,
    config: PanelConfig,
    fields: PanelFields,
    mode: Mode,
    last_edited: LastEdited,
    position: PanelPosition,
    history_visible: bool,
    last_computation: Option<Computation>,
}

impl<B: DurableBackend, V: PanelView> PanelController<B, V> {
    /// Build the panel from whatever was persisted and run the solver once.
    pub async fn open(
        store: Rc<PersistentStore<B>>,
        view: V,
        guard: EchoGuard,
        config: PanelConfig,
        saved_position: Option<PanelPosition>,
        saved_state: Option<PanelState>,
    ) -> Self {
        let state = saved_state.unwrap_or_else(|| {
            PanelState::new(
                Mode::default(),
                PanelFields::new("", "", &config.default_percent, &config.default_percent),
            )
        });
        let position = saved_position.unwrap_or(config.default_position);

        let mut controller = Self {
            engine: PricingEngine::new(),
            ledger: HistoryLedger::new(Rc::clone(&store), &config),
            store,
            view,
            guard,
            config,
            fields: PanelFields::default(),
            mode: state.mode,
            last_edited: LastEdited::None,
            position,
            history_visible: false,
            last_computation: None,
        };

        crate::log_info!(
            LogComponent::Application("Panel"),
            "open in {} mode at ({}, {})",
            state.mode,
            position.left,
            position.top
        );

        controller.view.set_position(position);
        controller.view.set_mode(state.mode);
        controller.write_fields(&state.fields);
        controller.recompute(LastEdited::None);
        controller.persist_state().await;
        controller
    }

    pub fn fields(&self) -> &PanelFields {
        &self.fields
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn last_edited(&self) -> LastEdited {
        self.last_edited
    }

    pub fn position(&self) -> PanelPosition {
        self.position
    }

    pub fn history_visible(&self) -> bool {
        self.history_visible
    }

    pub fn guard(&self) -> &EchoGuard {
        &self.guard
    }

    pub fn store(&self) -> &Rc<PersistentStore<B>> {
        &self.store
    }

    pub fn ledger(&self) -> &HistoryLedger<B> {
        &self.ledger
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn derived(&self) -> DerivedLine {
        self.last_computation
            .as_ref()
            .map(|c| c.derived)
            .unwrap_or(DerivedLine::Unavailable)
    }

    pub fn error(&self) -> Option<FieldError> {
        self.last_computation.as_ref().and_then(|c| c.error)
    }

    /// Write all four texts into the view as one echo-free batch.
    fn write_fields(&mut self, fields: &PanelFields) {
        let _scope = self.guard.hold();
        for field in [Field::Cost, Field::Price, Field::Margin, Field::Markup] {
            let value = fields.get(field);
            self.fields.set(field, value);
            self.view.set_field(field, value);
        }
    }

    fn recompute(&mut self, direction: LastEdited) -> &Computation {
        self.view.set_error(Field::Margin, None);
        self.view.set_error(Field::Markup, None);

        let computation = self.engine.compute(&self.fields, self.mode, direction);

        {
            let _scope = self.guard.hold();
            for (field, value) in computation.updates.iter() {
                self.fields.set(field, value);
                self.view.set_field(field, value);
            }
        }

        if let Some(FieldError { field, error }) = computation.error {
            let message = error.to_string();
            crate::log_debug!(LogComponent::Application("Panel"), "{} on {}", message, field);
            self.view.set_error(field, Some(&message));
        }
        self.view.set_derived(&computation.derived.to_string());

        self.last_computation.insert(computation)
    }

    async fn persist_state(&self) {
        let state = PanelState::new(self.mode, self.fields.clone());
        self.store.set(StorePatch::new().state(state)).await;
    }

    /// A keystroke (or spin press) changed `field` to `raw`. Returns false
    /// when the event was a programmatic echo and got dropped.
    pub async fn handle_input(&mut self, field: Field, raw: &str) -> bool {
        if self.guard.is_held() {
            crate::log_trace!(LogComponent::Application("Panel"), "echo on {} ignored", field);
            return false;
        }

        self.fields.set(field, raw);
        self.last_edited = field.edit_tag();
        self.recompute(self.last_edited);
        self.persist_state().await;
        true
    }

    /// Switch tabs. A usable price stays put and the new mode's percentage
    /// is solved from it; without one the last edit direction applies.
    pub async fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.view.set_mode(mode);

        let direction = if FieldValue::parse(&self.fields.price).positive().is_some() {
            LastEdited::Price
        } else {
            self.last_edited
        };
        self.recompute(direction);
        self.persist_state().await;
    }

    pub async fn render_history(&self) {
        let rows: Vec<HistoryRow> = self
            .ledger
            .list()
            .await
            .iter()
            .enumerate()
            .map(|(index, entry)| HistoryRow::new(index, entry))
            .collect();
        crate::log_trace!(LogComponent::Application("Panel"), "render {} history rows", rows.len());
        self.view.render_history(&rows);
    }

    pub async fn toggle_history(&mut self) {
        self.render_history().await;
        self.history_visible = !self.history_visible;
        self.view.set_history_visible(self.history_visible);
    }

    /// Save the current computation (Enter key, save button). With
    /// `reveal` the history list is refreshed and opened.
    pub async fn save_to_history(&mut self, reveal: bool) -> AppendOutcome {
        let outcome = self.ledger.append(self.mode, &self.fields).await;
        if reveal {
            self.render_history().await;
            self.history_visible = true;
            self.view.set_history_visible(true);
        }
        outcome
    }

    /// Price text for the clipboard; `None` while the price is blank.
    pub fn clipboard_text(&self) -> Option<String> {
        let text = self.fields.price.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Copy the price and record it in history. A refused clipboard is
    /// logged; the history entry is written either way.
    pub async fn copy_price<C: Clipboard>(&mut self, clipboard: &C) -> Option<String> {
        let text = self.clipboard_text()?;
        match clipboard.write_text(&text).await {
            Ok(()) => self.view.show_toast(&self.config.copied_toast),
            Err(e) => {
                crate::log_warn!(LogComponent::Application("Panel"), "copy failed: {}", e);
            }
        }
        self.save_to_history(false).await;
        Some(text)
    }

    /// Load a saved entry through the same path as a price edit.
    pub async fn select_history(&mut self, index: usize) -> bool {
        let Some(entry) = self.ledger.get(index).await else {
            return false;
        };
        let state = entry.to_state();

        self.mode = state.mode;
        self.view.set_mode(state.mode);
        self.write_fields(&state.fields);
        self.last_edited = LastEdited::Price;
        self.recompute(LastEdited::Price);
        self.persist_state().await;
        true
    }

    pub async fn delete_history(&mut self, index: usize) -> Option<HistoryEntry> {
        let removed = self.ledger.remove(index).await;
        self.render_history().await;
        removed
    }

    pub async fn clear_history(&mut self) {
        self.ledger.clear().await;
        self.render_history().await;
        self.view.show_toast(&self.config.history_cleared_toast);
    }

    fn place(&mut self, position: PanelPosition, panel: Size, viewport: Size) -> PanelPosition {
        self.position = position.clamp_to(panel, viewport, self.config.viewport_slack);
        self.view.set_position(self.position);
        self.position
    }

    /// Drag released at `position`; keep it on screen and remember it.
    pub async fn drag_end(&mut self, position: PanelPosition, panel: Size, viewport: Size) -> PanelPosition {
        let placed = self.place(position, panel, viewport);
        self.store.set(StorePatch::new().position(placed)).await;
        placed
    }

    /// The window changed size. The panel is pulled back on screen but the
    /// saved position stays what the user chose.
    pub fn resize(&mut self, panel: Size, viewport: Size) -> PanelPosition {
        self.place(self.position, panel, viewport)
    }

    pub async fn reset_position(&mut self) -> PanelPosition {
        self.position = self.config.default_position;
        self.view.set_position(self.position);
        self.store.set(StorePatch::new().position(self.position)).await;
        self.view.show_toast(&self.config.position_reset_toast);
        self.position
    }

    pub fn close(self) {
        crate::log_info!(LogComponent::Application("Panel"), "close");
        self.view.unmount();
    }
}
