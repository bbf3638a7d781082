use gloo::storage::{LocalStorage, Storage, errors::StorageError as GlooStorageError};
use gloo::utils::format::JsValueSerdeExt;
use js_sys::{Object, Promise, Reflect};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::domain::errors::{StorageError, StorageResult};
use crate::domain::panel::{DurableBackend, StorageKey};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    fn chrome_storage_get(keys: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    fn chrome_storage_set(items: &JsValue) -> Result<Promise, JsValue>;
}

fn describe(error: &JsValue) -> String {
    error.as_string().unwrap_or_else(|| format!("{:?}", error))
}

/// `chrome.storage.local` of the hosting extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorageBackend;

impl ChromeStorageBackend {
    /// Whether `chrome.storage.local` exists in this context.
    pub fn is_available() -> bool {
        ["chrome", "storage", "local"]
            .iter()
            .try_fold(JsValue::from(js_sys::global()), |scope, name| {
                Reflect::get(&scope, &JsValue::from_str(name))
                    .ok()
                    .filter(|next| next.is_object())
            })
            .is_some()
    }
}

impl DurableBackend for ChromeStorageBackend {
    fn name(&self) -> &'static str {
        "chrome.storage.local"
    }

    async fn load(&self, key: StorageKey) -> StorageResult<Option<Value>> {
        let read = |e: JsValue| StorageError::Read(describe(&e));

        let promise = chrome_storage_get(key.as_ref()).map_err(read)?;
        let items = JsFuture::from(promise).await.map_err(read)?;
        let raw = Reflect::get(&items, &JsValue::from_str(key.as_ref())).map_err(read)?;
        if raw.is_undefined() || raw.is_null() {
            return Ok(None);
        }
        Ok(Some(raw.into_serde::<Value>()?))
    }

    async fn save(&self, key: StorageKey, value: &Value) -> StorageResult<()> {
        let write = |e: JsValue| StorageError::Write(describe(&e));

        let items = Object::new();
        let record = JsValue::from_serde(value)?;
        Reflect::set(&items, &JsValue::from_str(key.as_ref()), &record).map_err(write)?;
        let promise = chrome_storage_set(&items).map_err(write)?;
        JsFuture::from(promise).await.map_err(write)?;
        Ok(())
    }
}

/// `window.localStorage`, for pages running the panel outside an extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageBackend;

impl LocalStorageBackend {
    pub fn is_available() -> bool {
        web_sys::window()
            .and_then(|window| window.local_storage().ok().flatten())
            .is_some()
    }
}

impl DurableBackend for LocalStorageBackend {
    fn name(&self) -> &'static str {
        "localStorage"
    }

    async fn load(&self, key: StorageKey) -> StorageResult<Option<Value>> {
        match LocalStorage::get::<Value>(key) {
            Ok(value) => Ok(Some(value)),
            Err(GlooStorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(StorageError::Read(e.to_string())),
        }
    }

    async fn save(&self, key: StorageKey, value: &Value) -> StorageResult<()> {
        LocalStorage::set(key, value).map_err(|e| StorageError::Write(e.to_string()))
    }
}

/// Whichever browser medium the page offers.
#[derive(Debug, Clone, Copy)]
pub enum BrowserBackend {
    Chrome(ChromeStorageBackend),
    Local(LocalStorageBackend),
}

impl BrowserBackend {
    /// Extension storage first, then `localStorage`; `None` means the panel
    /// runs from memory only.
    pub fn detect() -> Option<Self> {
        if ChromeStorageBackend::is_available() {
            Some(BrowserBackend::Chrome(ChromeStorageBackend))
        } else if LocalStorageBackend::is_available() {
            Some(BrowserBackend::Local(LocalStorageBackend))
        } else {
            None
        }
    }
}

impl DurableBackend for BrowserBackend {
    fn name(&self) -> &'static str {
        match self {
            BrowserBackend::Chrome(backend) => backend.name(),
            BrowserBackend::Local(backend) => backend.name(),
        }
    }

    async fn load(&self, key: StorageKey) -> StorageResult<Option<Value>> {
        match self {
            BrowserBackend::Chrome(backend) => backend.load(key).await,
            BrowserBackend::Local(backend) => backend.load(key).await,
        }
    }

    async fn save(&self, key: StorageKey, value: &Value) -> StorageResult<()> {
        match self {
            BrowserBackend::Chrome(backend) => backend.save(key, value).await,
            BrowserBackend::Local(backend) => backend.save(key, value).await,
        }
    }
}
