use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::Capability;
use crate::handles::Handle;
use crate::terms::Term;
use crate::terms::TermStore;
use crate::BridgeError;

/// The lifecycle operations an engine context offers outside of callbacks.
///
/// The engine only ever stores the [`Handle`]s it receives here; notifications are sent back
/// through the functions in [`super::router`] and [`crate::observer::notify_clause`].
pub trait EngineContext {
    /// Attaches the propagator behind `handle`. Fails with [`BridgeError::IllegalState`] when a
    /// live propagator is already attached.
    fn propagate_init(&mut self, handle: Handle) -> Result<(), BridgeError>;

    /// Starts sending the events of `capability` to the propagator behind `handle`.
    fn propagate_enable(&mut self, handle: Handle, capability: Capability);

    /// Registers `term` for the whole search.
    fn propagate_register(&mut self, handle: Handle, term: Term);

    fn register_on_clause(&mut self, handle: Handle) -> Result<(), BridgeError>;

    fn unregister_on_clause(&mut self, handle: Handle);

    /// The flag the engine raises while it is searching.
    fn search_activity(&self) -> SearchActivity;

    fn terms(&mut self) -> &mut TermStore;
}

/// Shared flag telling the boundary whether an engine context is mid-search.
#[derive(Clone, Debug, Default)]
pub struct SearchActivity(Arc<AtomicBool>);

impl SearchActivity {
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks the search as active until the returned guard is dropped.
    pub fn enter(&self) -> SearchGuard {
        self.0.store(true, Ordering::Release);
        SearchGuard(self.clone())
    }
}

#[derive(Debug)]
pub struct SearchGuard(SearchActivity);

impl Drop for SearchGuard {
    fn drop(&mut self) {
        self.0 .0.store(false, Ordering::Release);
    }
}
