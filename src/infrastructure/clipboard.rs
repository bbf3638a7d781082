use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::domain::errors::AppError;
use crate::domain::panel::Clipboard;

/// `navigator.clipboard.writeText`, looked up at call time so pages without
/// the async clipboard API just report a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigatorClipboard;

fn binding_error(error: JsValue) -> AppError {
    AppError::Binding(error.as_string().unwrap_or_else(|| format!("{:?}", error)))
}

impl Clipboard for NavigatorClipboard {
    async fn write_text(&self, text: &str) -> Result<(), AppError> {
        let window = web_sys::window().ok_or_else(|| AppError::Binding("no window".to_string()))?;
        let clipboard = Reflect::get(&window.navigator(), &JsValue::from_str("clipboard"))
            .map_err(binding_error)?;
        let write_text: Function = Reflect::get(&clipboard, &JsValue::from_str("writeText"))
            .map_err(binding_error)?
            .dyn_into()
            .map_err(binding_error)?;
        let promise: Promise = write_text
            .call1(&clipboard, &JsValue::from_str(text))
            .map_err(binding_error)?
            .dyn_into()
            .map_err(binding_error)?;
        JsFuture::from(promise).await.map_err(binding_error)?;
        Ok(())
    }
}
