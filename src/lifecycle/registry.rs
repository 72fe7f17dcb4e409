//! Hook Registry
//!
//! Ordered, append-only store of cleanup hooks. Closed for good once the
//! drain takes its contents.

use crate::error::{Result, ShutdownError};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A unit of cleanup work, consumed exactly once during shutdown
pub type Hook = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct RegistryState {
    hooks: Vec<Hook>,
    draining: bool,
}

/// Stores hooks until shutdown drains them
///
/// Hooks come back out in **reverse order** of registration, so a
/// subsystem registered after its dependencies is torn down before them.
#[derive(Default)]
pub(crate) struct HookRegistry {
    state: Mutex<RegistryState>,
}

impl HookRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // Hooks run on their own threads and may panic; a poisoned lock
    // still guards a consistent Vec.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a hook. Fails once the registry has been drained.
    pub(crate) fn register(&self, hook: Hook) -> Result<()> {
        let mut state = self.lock();
        if state.draining {
            return Err(ShutdownError::ShutdownInProgress);
        }
        state.hooks.push(hook);
        tracing::debug!(registered = state.hooks.len(), "Registered exit hook");
        Ok(())
    }

    /// Close the registry and take every hook, last-registered first
    pub(crate) fn drain(&self) -> Vec<Hook> {
        let mut state = self.lock();
        state.draining = true;
        let mut hooks = std::mem::take(&mut state.hooks);
        hooks.reverse();
        hooks
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().hooks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_drain_reverse_order() {
        let registry = HookRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            registry
                .register(Box::new(move || order.lock().unwrap().push(i)))
                .unwrap();
        }
        assert_eq!(registry.len(), 3);

        for hook in registry.drain() {
            hook();
        }

        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_after_drain_fails() {
        let registry = HookRegistry::new();
        registry.drain();

        let result = registry.register(Box::new(|| {}));
        assert!(matches!(result, Err(ShutdownError::ShutdownInProgress)));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_second_drain_is_empty() {
        let registry = HookRegistry::new();
        registry.register(Box::new(|| {})).unwrap();

        assert_eq!(registry.drain().len(), 1);
        assert!(registry.drain().is_empty());
    }
}
