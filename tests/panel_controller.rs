use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::executor::block_on;
use kate_panel_wasm::application::{EchoGuard, HistoryRow, PanelController, PanelView};
use kate_panel_wasm::domain::errors::AppError;
use kate_panel_wasm::domain::history::AppendOutcome;
use kate_panel_wasm::domain::panel::{
    Clipboard, PanelConfig, PanelFields, PanelPosition, PanelState, Size,
};
use kate_panel_wasm::domain::pricing::{Field, LastEdited, Mode};
use kate_panel_wasm::infrastructure::storage::{MemoryBackend, PersistentStore};

/// View that remembers what it was told, and whether each field write
/// happened with echoes suppressed.
struct RecordingView {
    guard: EchoGuard,
    fields: RefCell<HashMap<Field, String>>,
    unguarded_writes: Cell<usize>,
    mode: Cell<Option<Mode>>,
    errors: RefCell<HashMap<Field, String>>,
    derived: RefCell<String>,
    position: Cell<Option<PanelPosition>>,
    rows: RefCell<Option<Vec<HistoryRow>>>,
    history_visible: Cell<bool>,
    toasts: RefCell<Vec<String>>,
    unmounted: Cell<bool>,
}

impl RecordingView {
    fn new(guard: EchoGuard) -> Self {
        Self {
            guard,
            fields: RefCell::default(),
            unguarded_writes: Cell::new(0),
            mode: Cell::new(None),
            errors: RefCell::default(),
            derived: RefCell::default(),
            position: Cell::new(None),
            rows: RefCell::new(None),
            history_visible: Cell::new(false),
            toasts: RefCell::default(),
            unmounted: Cell::new(false),
        }
    }

    fn field(&self, field: Field) -> String {
        self.fields.borrow().get(&field).cloned().unwrap_or_default()
    }

    fn error(&self, field: Field) -> Option<String> {
        self.errors.borrow().get(&field).cloned()
    }

    fn row_count(&self) -> Option<usize> {
        self.rows.borrow().as_ref().map(Vec::len)
    }
}

impl PanelView for RecordingView {
    fn set_field(&self, field: Field, value: &str) {
        if !self.guard.is_held() {
            self.unguarded_writes.set(self.unguarded_writes.get() + 1);
        }
        self.fields.borrow_mut().insert(field, value.to_string());
    }

    fn set_mode(&self, mode: Mode) {
        self.mode.set(Some(mode));
    }

    fn set_error(&self, field: Field, message: Option<&str>) {
        let mut errors = self.errors.borrow_mut();
        match message {
            Some(message) => errors.insert(field, message.to_string()),
            None => errors.remove(&field),
        };
    }

    fn set_derived(&self, text: &str) {
        *self.derived.borrow_mut() = text.to_string();
    }

    fn set_position(&self, position: PanelPosition) {
        self.position.set(Some(position));
    }

    fn render_history(&self, rows: &[HistoryRow]) {
        *self.rows.borrow_mut() = Some(rows.to_vec());
    }

    fn set_history_visible(&self, visible: bool) {
        self.history_visible.set(visible);
    }

    fn show_toast(&self, message: &str) {
        self.toasts.borrow_mut().push(message.to_string());
    }

    fn unmount(&self) {
        self.unmounted.set(true);
    }
}

struct FakeClipboard {
    accept: bool,
    written: RefCell<Vec<String>>,
}

impl FakeClipboard {
    fn new(accept: bool) -> Self {
        Self { accept, written: RefCell::default() }
    }
}

impl Clipboard for FakeClipboard {
    async fn write_text(&self, text: &str) -> Result<(), AppError> {
        if !self.accept {
            return Err(AppError::Binding("NotAllowedError".to_string()));
        }
        self.written.borrow_mut().push(text.to_string());
        Ok(())
    }
}

type Controller = PanelController<MemoryBackend, RecordingView>;

fn open_with(
    store: Rc<PersistentStore<MemoryBackend>>,
    position: Option<PanelPosition>,
    state: Option<PanelState>,
) -> Controller {
    let guard = EchoGuard::new();
    let view = RecordingView::new(guard.clone());
    block_on(PanelController::open(store, view, guard, PanelConfig::default(), position, state))
}

fn open() -> (Controller, MemoryBackend) {
    let backend = MemoryBackend::new();
    let store = Rc::new(PersistentStore::new(backend.clone()));
    (open_with(store, None, None), backend)
}

fn type_into(controller: &mut Controller, field: Field, raw: &str) -> bool {
    block_on(controller.handle_input(field, raw))
}

#[test]
fn opens_with_defaults() {
    let (controller, _) = open();
    let view = controller.view();

    assert_eq!(controller.mode(), Mode::Margin);
    assert_eq!(view.mode.get(), Some(Mode::Margin));
    assert_eq!(view.field(Field::Cost), "");
    assert_eq!(view.field(Field::Price), "");
    assert_eq!(view.field(Field::Margin), "99");
    assert_eq!(view.field(Field::Markup), "99");
    assert_eq!(view.position.get(), Some(PanelPosition::new(24.0, 24.0)));
    assert_eq!(*view.derived.borrow(), "Derived: —");
    assert_eq!(controller.last_edited(), LastEdited::None);
    assert!(!controller.history_visible());
}

#[test]
fn reopening_restores_partial_typing() {
    let store = Rc::new(PersistentStore::<MemoryBackend>::in_memory());
    let saved = PanelState::new(Mode::Markup, PanelFields::new("10,", "", "99", "2"));
    let controller = open_with(store, Some(PanelPosition::new(80.0, 90.0)), Some(saved));
    let view = controller.view();

    assert_eq!(view.mode.get(), Some(Mode::Markup));
    assert_eq!(view.field(Field::Cost), "10,");
    assert_eq!(view.field(Field::Price), "10.2");
    assert_eq!(view.position.get(), Some(PanelPosition::new(80.0, 90.0)));
}

#[test]
fn typing_solves_price_and_persists() {
    let (mut controller, _) = open();

    assert!(type_into(&mut controller, Field::Margin, "50"));
    assert!(type_into(&mut controller, Field::Cost, "10"));

    let view = controller.view();
    assert_eq!(view.field(Field::Price), "20");
    assert_eq!(*view.derived.borrow(), "Derived: Margin 50 % • Markup 100 %");
    assert_eq!(controller.last_edited(), LastEdited::Cost);

    let saved = block_on(controller.ledger().list());
    assert!(saved.is_empty());
    let state = block_on(controller.store().state()).expect("state");
    assert_eq!(state.fields.price, "20");
}

#[test]
fn computed_writes_never_echo() {
    let (mut controller, _) = open();
    type_into(&mut controller, Field::Cost, "10");
    type_into(&mut controller, Field::Price, "30");
    block_on(controller.set_mode(Mode::Markup));

    assert_eq!(controller.view().unguarded_writes.get(), 0);
    assert!(!controller.guard().is_held());
}

#[test]
fn input_during_programmatic_write_is_dropped() {
    let (mut controller, _) = open();
    let guard = controller.guard().clone();

    let scope = guard.hold();
    assert!(!type_into(&mut controller, Field::Cost, "10"));
    drop(scope);

    assert_eq!(controller.fields().cost, "");
    assert_eq!(controller.last_edited(), LastEdited::None);
}

#[test]
fn switching_mode_keeps_price() {
    let (mut controller, _) = open();
    block_on(controller.set_mode(Mode::Markup));
    type_into(&mut controller, Field::Markup, "25");
    type_into(&mut controller, Field::Cost, "10");
    assert_eq!(controller.fields().price, "12.5");

    block_on(controller.set_mode(Mode::Margin));

    assert_eq!(controller.fields().price, "12.5");
    assert_eq!(controller.fields().margin, "20");
    assert_eq!(controller.view().field(Field::Margin), "20");
}

#[test]
fn margin_of_one_hundred_flags_the_field() {
    let (mut controller, _) = open();
    type_into(&mut controller, Field::Cost, "10");
    type_into(&mut controller, Field::Margin, "100");

    let view = controller.view();
    assert_eq!(view.error(Field::Margin).as_deref(), Some("Margin % must be below 100."));
    assert_eq!(view.field(Field::Price), "");
    assert!(controller.error().is_some());
}

#[test]
fn switching_mode_without_price_follows_last_edit() {
    let (mut controller, _) = open();
    type_into(&mut controller, Field::Cost, "10");
    type_into(&mut controller, Field::Margin, "100");

    block_on(controller.set_mode(Mode::Markup));

    assert_eq!(controller.fields().price, "19.9");
    assert_eq!(controller.view().error(Field::Margin), None);
    assert!(controller.error().is_none());
}

#[test]
fn save_reveals_history() {
    let (mut controller, _) = open();
    type_into(&mut controller, Field::Margin, "50");
    type_into(&mut controller, Field::Cost, "10");

    assert_eq!(block_on(controller.save_to_history(true)), AppendOutcome::Inserted);
    assert_eq!(block_on(controller.save_to_history(true)), AppendOutcome::Duplicate);

    let view = controller.view();
    assert!(view.history_visible.get());
    let rows = view.rows.borrow().clone().expect("rendered");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label, "#1");
    assert_eq!(rows[0].headline, "Margin • C €10 → P €20");
}

#[test]
fn toggle_history_flips_visibility() {
    let (mut controller, _) = open();

    block_on(controller.toggle_history());
    assert!(controller.view().history_visible.get());
    assert_eq!(controller.view().row_count(), Some(0));

    block_on(controller.toggle_history());
    assert!(!controller.history_visible());
}

#[test]
fn copy_writes_clipboard_and_history() {
    let (mut controller, _) = open();
    type_into(&mut controller, Field::Margin, "50");
    type_into(&mut controller, Field::Cost, "10");
    let clipboard = FakeClipboard::new(true);

    let copied = block_on(controller.copy_price(&clipboard));

    assert_eq!(copied.as_deref(), Some("20"));
    assert_eq!(*clipboard.written.borrow(), vec!["20".to_string()]);
    assert_eq!(*controller.view().toasts.borrow(), vec!["Copied".to_string()]);
    assert_eq!(block_on(controller.ledger().list()).len(), 1);
    assert!(!controller.view().history_visible.get());
}

#[test]
fn refused_clipboard_still_saves_history() {
    let (mut controller, _) = open();
    type_into(&mut controller, Field::Margin, "50");
    type_into(&mut controller, Field::Cost, "10");

    let copied = block_on(controller.copy_price(&FakeClipboard::new(false)));

    assert_eq!(copied.as_deref(), Some("20"));
    assert!(controller.view().toasts.borrow().is_empty());
    assert_eq!(block_on(controller.ledger().list()).len(), 1);
}

#[test]
fn blank_price_copies_nothing() {
    let (mut controller, _) = open();
    let clipboard = FakeClipboard::new(true);

    assert_eq!(controller.clipboard_text(), None);
    assert_eq!(block_on(controller.copy_price(&clipboard)), None);
    assert!(clipboard.written.borrow().is_empty());
    assert!(block_on(controller.ledger().list()).is_empty());
}

#[test]
fn selecting_history_replays_entry() {
    let (mut controller, _) = open();
    type_into(&mut controller, Field::Margin, "50");
    type_into(&mut controller, Field::Cost, "10");
    block_on(controller.save_to_history(false));

    block_on(controller.set_mode(Mode::Markup));
    type_into(&mut controller, Field::Markup, "10");
    assert_eq!(controller.fields().price, "11");

    assert!(block_on(controller.select_history(0)));

    assert_eq!(controller.mode(), Mode::Margin);
    assert_eq!(controller.last_edited(), LastEdited::Price);
    assert_eq!(controller.fields(), &PanelFields::new("10", "20", "50", "100"));
    assert_eq!(controller.view().mode.get(), Some(Mode::Margin));
    assert_eq!(controller.view().unguarded_writes.get(), 0);
    assert!(!block_on(controller.select_history(3)));
}

#[test]
fn delete_and_clear_rerender() {
    let (mut controller, _) = open();
    for cost in ["1", "2", "3"] {
        type_into(&mut controller, Field::Cost, cost);
        block_on(controller.save_to_history(false));
    }

    let removed = block_on(controller.delete_history(0)).expect("removed");
    assert_eq!(removed.cost, Some(3.0));
    assert_eq!(controller.view().row_count(), Some(2));
    assert!(block_on(controller.delete_history(7)).is_none());

    block_on(controller.clear_history());
    assert_eq!(controller.view().row_count(), Some(0));
    assert_eq!(*controller.view().toasts.borrow(), vec!["History cleared".to_string()]);
}

#[test]
fn drag_clamps_and_persists() {
    let (mut controller, backend) = open();
    let panel = Size::new(300.0, 200.0);

    let placed = block_on(controller.drag_end(
        PanelPosition::new(5000.0, -10.0),
        panel,
        Size::new(1000.0, 800.0),
    ));

    assert_eq!(placed, PanelPosition::new(696.0, 0.0));
    assert_eq!(controller.view().position.get(), Some(placed));
    assert_eq!(
        backend.record(kate_panel_wasm::domain::panel::StorageKey::PanelPosition),
        Some(serde_json::json!({"left": 696.0, "top": 0.0}))
    );
}

#[test]
fn resize_pulls_panel_back_without_saving() {
    let (mut controller, _) = open();
    let panel = Size::new(300.0, 200.0);
    block_on(controller.drag_end(PanelPosition::new(696.0, 500.0), panel, Size::new(1000.0, 800.0)));

    let placed = controller.resize(panel, Size::new(800.0, 600.0));

    assert_eq!(placed, PanelPosition::new(496.0, 396.0));
    let saved = block_on(controller.store().position());
    assert_eq!(saved, Some(PanelPosition::new(696.0, 500.0)));
}

#[test]
fn reset_position_returns_to_corner() {
    let (mut controller, _) = open();
    let panel = Size::new(300.0, 200.0);
    block_on(controller.drag_end(PanelPosition::new(400.0, 300.0), panel, Size::new(1000.0, 800.0)));

    let placed = block_on(controller.reset_position());

    assert_eq!(placed, PanelPosition::new(24.0, 24.0));
    assert_eq!(block_on(controller.store().position()), Some(placed));
    assert_eq!(*controller.view().toasts.borrow(), vec!["Position reset".to_string()]);
}

#[test]
fn close_unmounts_view() {
    let guard = EchoGuard::new();
    let view = Rc::new(RecordingView::new(guard.clone()));
    let store = Rc::new(PersistentStore::<MemoryBackend>::in_memory());
    let controller = block_on(PanelController::open(
        store,
        SharedView(Rc::clone(&view)),
        guard,
        PanelConfig::default(),
        None,
        None,
    ));

    controller.close();

    assert!(view.unmounted.get());
}

/// Lets a test keep its own handle on a view the controller owns.
struct SharedView(Rc<RecordingView>);

impl PanelView for SharedView {
    fn set_field(&self, field: Field, value: &str) {
        self.0.set_field(field, value)
    }
    fn set_mode(&self, mode: Mode) {
        self.0.set_mode(mode)
    }
    fn set_error(&self, field: Field, message: Option<&str>) {
        self.0.set_error(field, message)
    }
    fn set_derived(&self, text: &str) {
        self.0.set_derived(text)
    }
    fn set_position(&self, position: PanelPosition) {
        self.0.set_position(position)
    }
    fn render_history(&self, rows: &[HistoryRow]) {
        self.0.render_history(rows)
    }
    fn set_history_visible(&self, visible: bool) {
        self.0.set_history_visible(visible)
    }
    fn show_toast(&self, message: &str) {
        self.0.show_toast(message)
    }
    fn unmount(&self) {
        self.0.unmount()
    }
}
