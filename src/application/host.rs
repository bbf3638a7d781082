use std::rc::Rc;

use crate::application::controller::{PanelController, PanelView};
use crate::application::echo_guard::EchoGuard;
use crate::domain::{
    logging::LogComponent,
    panel::{DurableBackend, PanelConfig},
};
use crate::global_state::PanelRegistry;
use crate::infrastructure::storage::PersistentStore;

/// Owner of the document's single panel slot. Opens and closes the panel on
/// the toggle signal; a fresh view is built for every opening.
pub struct PanelHost<B, V, F>
where
    B: DurableBackend,
    V: PanelView,
    F: Fn() -> V,
{
    store: Rc<PersistentStore<B>>,
    config: PanelConfig,
    guard: EchoGuard,
    make_view: F,
    controller: Option<PanelController<B, V>>,
}

impl<B, V, F> PanelHost<B, V, F>
where
    B: DurableBackend,
    V: PanelView,
    F: Fn() -> V,
{
    /// Claim `registry` for this document. `None` when another host already
    /// holds it.
    pub fn install(
        registry: &PanelRegistry,
        store: Rc<PersistentStore<B>>,
        config: PanelConfig,
        guard: EchoGuard,
        make_view: F,
    ) -> Option<Self> {
        if !registry.try_claim() {
            crate::log_info!(LogComponent::Application("Host"), "panel already injected");
            return None;
        }
        crate::log_debug!(LogComponent::Application("Host"), "panel host installed");
        Some(Self { store, config, guard, make_view, controller: None })
    }

    pub fn is_open(&self) -> bool {
        self.controller.is_some()
    }

    pub fn controller(&self) -> Option<&PanelController<B, V>> {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut PanelController<B, V>> {
        self.controller.as_mut()
    }

    pub fn store(&self) -> &Rc<PersistentStore<B>> {
        &self.store
    }

    /// Open the panel if closed, close it if open. Returns whether the panel
    /// is open afterwards.
    pub async fn handle_toggle(&mut self) -> bool {
        if self.close() {
            return false;
        }

        let position = self.store.position().await;
        let state = self.store.state().await;
        let controller = PanelController::open(
            Rc::clone(&self.store),
            (self.make_view)(),
            self.guard.clone(),
            self.config.clone(),
            position,
            state,
        )
        .await;
        self.controller = Some(controller);
        true
    }

    /// Close button and Escape. Returns false when nothing was open.
    pub fn close(&mut self) -> bool {
        match self.controller.take() {
            Some(controller) => {
                controller.close();
                true
            }
            None => false,
        }
    }
}
