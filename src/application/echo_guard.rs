use std::cell::Cell;
use std::rc::Rc;

/// Marks programmatic field writes so the input handlers can tell them apart
/// from typing. Clones share the flag.
///
/// While an [`EchoScope`] is alive every input event is dropped, which keeps
/// a computed value from being fed back into the solver as a user edit.
#[derive(Debug, Clone, Default)]
pub struct EchoGuard {
    held: Rc<Cell<bool>>,
}

impl EchoGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    /// Suppress echoes until the returned scope is dropped. Scopes nest.
    pub fn hold(&self) -> EchoScope {
        let previous = self.held.replace(true);
        EchoScope { held: Rc::clone(&self.held), previous }
    }

    /// Run `writes` as one suppressed batch.
    pub fn batch<R>(&self, writes: impl FnOnce() -> R) -> R {
        let _scope = self.hold();
        writes()
    }
}

#[must_use = "the guard is released as soon as the scope is dropped"]
pub struct EchoScope {
    held: Rc<Cell<bool>>,
    previous: bool,
}

impl Drop for EchoScope {
    fn drop(&mut self) {
        self.held.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::EchoGuard;

    #[test]
    fn nested_scopes_restore_outer_state() {
        let guard = EchoGuard::new();
        {
            let _outer = guard.hold();
            {
                let _inner = guard.clone().hold();
                assert!(guard.is_held());
            }
            assert!(guard.is_held());
        }
        assert!(!guard.is_held());
    }

    #[test]
    fn batch_releases_after_closure() {
        let guard = EchoGuard::new();
        let seen = guard.batch(|| guard.is_held());
        assert!(seen);
        assert!(!guard.is_held());
    }
}
