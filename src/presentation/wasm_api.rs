use std::rc::Rc;
use std::str::FromStr;

use futures::lock::Mutex;
use gloo::utils::format::JsValueSerdeExt;
use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::application::{EchoGuard, PanelHost};
use crate::domain::{
    logging::LogComponent,
    panel::{DurableBackend, PanelConfig, PanelPosition, Size},
    pricing::{Field, Mode},
};
use crate::global_state::global_registry;
use crate::infrastructure::{
    clipboard::NavigatorClipboard,
    storage::{BrowserBackend, PersistentStore},
};
use crate::presentation::js_view::JsPanelView;

/// Runtime message that opens or closes the panel.
pub const TOGGLE_MESSAGE: &str = "TOGGLE_KATE_PANEL";

type BrowserHost = PanelHost<BrowserBackend, JsPanelView, Box<dyn Fn() -> JsPanelView>>;

fn to_js<T: Serialize>(value: &T) -> JsValue {
    JsValue::from_serde(value).unwrap_or(JsValue::NULL)
}

/// Run `$body` against the open controller inside a promise. Resolves to
/// `undefined` while the panel is closed.
macro_rules! with_open_panel {
    ($host:expr, |$controller:ident| $body:expr) => {{
        let host = Rc::clone(&$host);
        future_to_promise(async move {
            let mut host = host.lock().await;
            match host.controller_mut() {
                Some($controller) => $body,
                None => Ok(JsValue::UNDEFINED),
            }
        })
    }};
}

/// Entry point for the content script. One instance per document; a second
/// construction is refused.
#[wasm_bindgen]
pub struct KatePanelApi {
    host: Rc<Mutex<BrowserHost>>,
    guard: EchoGuard,
}

#[wasm_bindgen]
impl KatePanelApi {
    /// `callbacks` is the view object (`setField`, `setMode`, `setError`,
    /// `setDerived`, `setPosition`, `renderHistory`, `setHistoryVisible`,
    /// `showToast`, `unmount`).
    #[wasm_bindgen(constructor)]
    pub fn new(callbacks: Object) -> Result<KatePanelApi, JsValue> {
        Self::build(callbacks, PanelConfig::default())
    }

    /// Same as the constructor with a partial [`PanelConfig`] in camelCase.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(callbacks: Object, config: JsValue) -> Result<KatePanelApi, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            PanelConfig::default()
        } else {
            config
                .into_serde::<PanelConfig>()
                .map_err(|e| JsValue::from_str(&format!("invalid panel config: {}", e)))?
        };
        Self::build(callbacks, config)
    }

    /// Open when closed, close when open. Resolves to the new open state.
    #[wasm_bindgen(js_name = handleToggle)]
    pub fn handle_toggle(&self) -> Promise {
        let host = Rc::clone(&self.host);
        future_to_promise(async move {
            let open = host.lock().await.handle_toggle().await;
            Ok(JsValue::from_bool(open))
        })
    }

    #[wasm_bindgen(js_name = isOpen)]
    pub fn is_open(&self) -> Promise {
        let host = Rc::clone(&self.host);
        future_to_promise(async move { Ok(JsValue::from_bool(host.lock().await.is_open())) })
    }

    pub fn close(&self) -> Promise {
        let host = Rc::clone(&self.host);
        future_to_promise(async move { Ok(JsValue::from_bool(host.lock().await.close())) })
    }

    /// `field` is one of `cost`, `price`, `kate`, `markup`. Resolves to false
    /// for echoes of the panel's own writes.
    #[wasm_bindgen(js_name = handleInput)]
    pub fn handle_input(&self, field: String, raw: String) -> Promise {
        // Checked before queueing: the write that caused the echo may still
        // hold the host lock.
        if self.guard.is_held() {
            return Promise::resolve(&JsValue::FALSE);
        }
        let field = match Field::from_str(&field) {
            Ok(field) => field,
            Err(_) => return Promise::reject(&JsValue::from_str(&format!("unknown field {}", field))),
        };
        with_open_panel!(self.host, |controller| {
            Ok(JsValue::from_bool(controller.handle_input(field, &raw).await))
        })
    }

    /// `mode` is `kate` or `markup`.
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&self, mode: String) -> Promise {
        let mode = match Mode::from_str(&mode) {
            Ok(mode) => mode,
            Err(_) => return Promise::reject(&JsValue::from_str(&format!("unknown mode {}", mode))),
        };
        with_open_panel!(self.host, |controller| {
            controller.set_mode(mode).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Resolves to `inserted`, `duplicate` or `rejected`.
    #[wasm_bindgen(js_name = saveToHistory)]
    pub fn save_to_history(&self, reveal: bool) -> Promise {
        with_open_panel!(self.host, |controller| {
            let outcome = controller.save_to_history(reveal).await;
            Ok(JsValue::from_str(outcome.as_ref()))
        })
    }

    /// Resolves to the copied text, or `undefined` with an empty price.
    #[wasm_bindgen(js_name = copyPrice)]
    pub fn copy_price(&self) -> Promise {
        with_open_panel!(self.host, |controller| {
            let copied = controller.copy_price(&NavigatorClipboard).await;
            Ok(copied.map(JsValue::from).unwrap_or(JsValue::UNDEFINED))
        })
    }

    #[wasm_bindgen(js_name = clipboardText)]
    pub fn clipboard_text(&self) -> Promise {
        with_open_panel!(self.host, |controller| {
            Ok(controller.clipboard_text().map(JsValue::from).unwrap_or(JsValue::UNDEFINED))
        })
    }

    #[wasm_bindgen(js_name = toggleHistory)]
    pub fn toggle_history(&self) -> Promise {
        with_open_panel!(self.host, |controller| {
            controller.toggle_history().await;
            Ok(JsValue::from_bool(controller.history_visible()))
        })
    }

    #[wasm_bindgen(js_name = selectHistory)]
    pub fn select_history(&self, index: usize) -> Promise {
        with_open_panel!(self.host, |controller| {
            Ok(JsValue::from_bool(controller.select_history(index).await))
        })
    }

    /// Resolves to whether an entry was removed.
    #[wasm_bindgen(js_name = deleteHistory)]
    pub fn delete_history(&self, index: usize) -> Promise {
        with_open_panel!(self.host, |controller| {
            Ok(JsValue::from_bool(controller.delete_history(index).await.is_some()))
        })
    }

    #[wasm_bindgen(js_name = clearHistory)]
    pub fn clear_history(&self) -> Promise {
        with_open_panel!(self.host, |controller| {
            controller.clear_history().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Resolves to the clamped `{ left, top }` that was stored.
    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(
        &self,
        left: f64,
        top: f64,
        panel_width: f64,
        panel_height: f64,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Promise {
        let position = PanelPosition::new(left, top);
        let panel = Size::new(panel_width, panel_height);
        let viewport = Size::new(viewport_width, viewport_height);
        with_open_panel!(self.host, |controller| {
            let placed = controller.drag_end(position, panel, viewport).await;
            Ok(to_js(&placed))
        })
    }

    pub fn resize(
        &self,
        panel_width: f64,
        panel_height: f64,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Promise {
        let panel = Size::new(panel_width, panel_height);
        let viewport = Size::new(viewport_width, viewport_height);
        with_open_panel!(self.host, |controller| {
            Ok(to_js(&controller.resize(panel, viewport)))
        })
    }

    #[wasm_bindgen(js_name = resetPosition)]
    pub fn reset_position(&self) -> Promise {
        with_open_panel!(self.host, |controller| {
            Ok(to_js(&controller.reset_position().await))
        })
    }

    /// Subscribe to `chrome.runtime.onMessage` and toggle on
    /// `{ type: "TOGGLE_KATE_PANEL" }`.
    #[wasm_bindgen(js_name = listenForToggle)]
    pub fn listen_for_toggle(&self) -> Result<(), JsValue> {
        let (on_message, add_listener) = runtime_on_message()?;
        let host = Rc::clone(&self.host);

        let listener = Closure::<dyn FnMut(JsValue)>::new(move |message: JsValue| {
            let kind = Reflect::get(&message, &JsValue::from_str("type"))
                .ok()
                .and_then(|kind| kind.as_string());
            if kind.as_deref() != Some(TOGGLE_MESSAGE) {
                return;
            }
            let host = Rc::clone(&host);
            spawn_local(async move {
                let open = host.lock().await.handle_toggle().await;
                crate::log_debug!(LogComponent::Presentation("Api"), "toggled, open={}", open);
            });
        });

        add_listener.call1(&on_message, listener.as_ref())?;
        // Lives as long as the page.
        listener.forget();
        Ok(())
    }
}

impl KatePanelApi {
    fn build(callbacks: Object, config: PanelConfig) -> Result<KatePanelApi, JsValue> {
        let backend = BrowserBackend::detect();
        match &backend {
            Some(backend) => {
                crate::log_info!(LogComponent::Presentation("Api"), "storage: {}", backend.name());
            }
            None => {
                crate::log_warn!(LogComponent::Presentation("Api"), "no durable storage, using memory");
            }
        }

        let store = Rc::new(PersistentStore::with_backend(backend));
        let guard = EchoGuard::new();
        let make_view: Box<dyn Fn() -> JsPanelView> =
            Box::new(move || JsPanelView::new(callbacks.clone()));

        let host = PanelHost::install(global_registry(), store, config, guard.clone(), make_view)
            .ok_or_else(|| JsValue::from_str("panel already injected"))?;

        Ok(KatePanelApi { host: Rc::new(Mutex::new(host)), guard })
    }
}

/// `chrome.runtime.onMessage` and its `addListener`.
fn runtime_on_message() -> Result<(JsValue, Function), JsValue> {
    let chrome = Reflect::get(&js_sys::global(), &JsValue::from_str("chrome"))?;
    if chrome.is_undefined() {
        return Err(JsValue::from_str("chrome runtime unavailable"));
    }
    let runtime = Reflect::get(&chrome, &JsValue::from_str("runtime"))?;
    let on_message = Reflect::get(&runtime, &JsValue::from_str("onMessage"))?;
    let add: Function = Reflect::get(&on_message, &JsValue::from_str("addListener"))?.dyn_into()?;
    Ok((on_message, add))
}
