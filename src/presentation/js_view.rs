use gloo::utils::format::JsValueSerdeExt;
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};

use crate::application::{EMPTY_HISTORY_TEXT, HistoryRow, PanelView};
use crate::domain::{
    logging::LogComponent,
    panel::PanelPosition,
    pricing::{Field, Mode},
};

/// [`PanelView`] forwarding to a plain object of callbacks supplied by the
/// shell, e.g. `{ setField(field, value) {...}, showToast(msg) {...} }`.
/// Missing callbacks are skipped.
pub struct JsPanelView {
    callbacks: Object,
}

impl JsPanelView {
    pub fn new(callbacks: Object) -> Self {
        Self { callbacks }
    }

    fn call(&self, name: &str, args: &[JsValue]) {
        let callback = Reflect::get(&self.callbacks, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok());
        let Some(callback) = callback else {
            crate::log_trace!(LogComponent::Presentation("View"), "no {} callback", name);
            return;
        };

        let args: Array = args.iter().collect();
        if let Err(e) = callback.apply(&self.callbacks, &args) {
            crate::log_error!(LogComponent::Presentation("View"), "{} threw: {:?}", name, e);
        }
    }
}

impl PanelView for JsPanelView {
    fn set_field(&self, field: Field, value: &str) {
        self.call("setField", &[field.as_ref().into(), value.into()]);
    }

    fn set_mode(&self, mode: Mode) {
        self.call("setMode", &[mode.as_ref().into()]);
    }

    fn set_error(&self, field: Field, message: Option<&str>) {
        self.call("setError", &[field.as_ref().into(), message.unwrap_or_default().into()]);
    }

    fn set_derived(&self, text: &str) {
        self.call("setDerived", &[text.into()]);
    }

    fn set_position(&self, position: PanelPosition) {
        self.call("setPosition", &[position.left.into(), position.top.into()]);
    }

    fn render_history(&self, rows: &[HistoryRow]) {
        let rows = JsValue::from_serde(rows).unwrap_or(JsValue::NULL);
        self.call("renderHistory", &[rows, EMPTY_HISTORY_TEXT.into()]);
    }

    fn set_history_visible(&self, visible: bool) {
        self.call("setHistoryVisible", &[visible.into()]);
    }

    fn show_toast(&self, message: &str) {
        self.call("showToast", &[message.into()]);
    }

    fn unmount(&self) {
        self.call("unmount", &[]);
    }
}
