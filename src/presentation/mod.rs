pub mod js_view;
pub mod wasm_api;

pub use js_view::JsPanelView;
pub use wasm_api::{KatePanelApi, TOGGLE_MESSAGE};
