//! Opaque identities for objects that cross the engine boundary.
//!
//! An engine never stores a reference to a user propagator or a clause observer; it stores the
//! [`Handle`] it was given at registration and passes it back with every notification. The
//! boundary resolves the handle through the process-wide table, which is created lazily on first
//! use. Entries are only removed when their owner releases them.
mod handle;
mod handle_table;

use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;
use std::sync::Mutex;

pub use handle::Handle;
pub use handle_table::HandleTable;
use once_cell::sync::Lazy;

use crate::observer::ObserverSlot;
use crate::propagation::Attachment;

/// The kinds of objects which are registered with an engine.
#[derive(Clone)]
pub(crate) enum Registered {
    Propagator(Arc<Mutex<Attachment>>),
    Observer(Arc<Mutex<ObserverSlot>>),
}

impl Debug for Registered {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Registered::Propagator(_) => f.write_str("Registered::Propagator"),
            Registered::Observer(_) => f.write_str("Registered::Observer"),
        }
    }
}

static REGISTRY: Lazy<HandleTable<Registered>> = Lazy::new(HandleTable::default);

pub(crate) fn registry() -> &'static HandleTable<Registered> {
    &REGISTRY
}

/// Whether `handle` currently refers to a live propagator or observer.
///
/// Engines use this to drop registrations whose owner has released them.
pub fn is_live(handle: Handle) -> bool {
    registry().contains(handle)
}
