use serde_json::Value;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter};

use crate::domain::errors::{AppError, StorageResult};

/// The three whole records the panel persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, AsRefStr)]
pub enum StorageKey {
    #[strum(serialize = "katePanelPos")]
    PanelPosition,
    #[strum(serialize = "katePanelState")]
    PanelState,
    #[strum(serialize = "kateHistory")]
    History,
}

/// A durable key/value medium (extension storage, `localStorage`, ...).
///
/// Records are read and written whole. `Ok(None)` means nothing is stored
/// under the key.
#[allow(async_fn_in_trait)]
pub trait DurableBackend {
    fn name(&self) -> &'static str;

    async fn load(&self, key: StorageKey) -> StorageResult<Option<Value>>;

    async fn save(&self, key: StorageKey, value: &Value) -> StorageResult<()>;
}

/// Where a copied price goes. Failure is reported, never fatal.
#[allow(async_fn_in_trait)]
pub trait Clipboard {
    async fn write_text(&self, text: &str) -> Result<(), AppError>;
}
