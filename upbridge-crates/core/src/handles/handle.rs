use std::fmt::Display;
use std::fmt::Formatter;
use std::num::NonZeroU64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Source of handle identities for the whole process.
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// An opaque identity for an object registered with an engine.
///
/// Identities come from a single process-wide counter, so a handle is never reused, not even
/// after it has been released.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Handle(NonZeroU64);

impl Handle {
    pub(crate) fn fresh() -> Handle {
        let value = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        // The counter starts at one and 2^64 allocations are out of reach.
        Handle(NonZeroU64::new(value).unwrap_or(NonZeroU64::MIN))
    }

    /// The raw identity, as an engine would store it.
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Reconstructs a handle from a raw identity previously obtained through [`Handle::get`].
    pub fn from_raw(value: u64) -> Option<Handle> {
        NonZeroU64::new(value).map(Handle)
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}
