use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Presence guard: at most one panel per document.
///
/// The content script may be injected more than once into the same page; the
/// first injection claims the registry and later ones back off.
#[derive(Debug, Default)]
pub struct PanelRegistry {
    claimed: AtomicBool,
}

impl PanelRegistry {
    pub const fn new() -> Self {
        Self { claimed: AtomicBool::new(false) }
    }

    /// True for the first caller only.
    pub fn try_claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::SeqCst)
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    pub fn release(&self) {
        self.claimed.store(false, Ordering::SeqCst);
    }
}

static REGISTRY: OnceCell<PanelRegistry> = OnceCell::new();

/// The registry shared by every entry point of this document.
pub fn global_registry() -> &'static PanelRegistry {
    REGISTRY.get_or_init(PanelRegistry::new)
}
