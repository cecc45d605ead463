use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use log::trace;

use super::Handle;
use crate::containers::HashMap;
use crate::BridgeError;

/// Maps handles onto the objects they were allocated for.
///
/// The table can be shared between threads; allocation, resolution and release may happen
/// concurrently from several engines. The table does not own the lifecycle of its entries: an
/// entry stays reachable until whoever allocated it calls [`HandleTable::release`].
#[derive(Debug)]
pub struct HandleTable<T> {
    slots: Mutex<HashMap<Handle, T>>,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::default()),
        }
    }
}

impl<T: Clone> HandleTable<T> {
    /// Stores `object` and returns the fresh handle which identifies it.
    pub fn allocate(&self, object: T) -> Handle {
        let handle = Handle::fresh();
        let previous = self.slots().insert(handle, object);
        debug_assert!(previous.is_none(), "handles are never reused");
        trace!("allocated {handle}");
        handle
    }

    /// Returns the object behind `handle`.
    pub fn resolve(&self, handle: Handle) -> Result<T, BridgeError> {
        self.slots()
            .get(&handle)
            .cloned()
            .ok_or(BridgeError::InvalidHandle(handle))
    }

    /// Removes the entry for `handle`; any later use of the handle fails.
    pub fn release(&self, handle: Handle) -> Result<T, BridgeError> {
        let object = self
            .slots()
            .remove(&handle)
            .ok_or(BridgeError::InvalidHandle(handle))?;
        trace!("released {handle}");
        Ok(object)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.slots().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Handle, T>> {
        // No user code runs while the map is locked, so a poisoned map is still consistent.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn resolve_returns_the_allocated_object() {
        let table = HandleTable::default();
        let handle = table.allocate("propagator");

        assert_eq!(Ok("propagator"), table.resolve(handle));
        assert_eq!(1, table.len());
    }

    #[test]
    fn released_handles_no_longer_resolve() {
        let table = HandleTable::default();
        let handle = table.allocate(5);

        assert_eq!(Ok(5), table.release(handle));
        assert_eq!(Err(BridgeError::InvalidHandle(handle)), table.resolve(handle));
        assert_eq!(Err(BridgeError::InvalidHandle(handle)), table.release(handle));
        assert!(table.is_empty());
    }

    #[test]
    fn handles_are_not_reused_after_release() {
        let table = HandleTable::default();
        let first = table.allocate(1);
        let _ = table.release(first);
        let second = table.allocate(2);

        assert_ne!(first, second);
        assert!(table.resolve(first).is_err());
    }

    #[test]
    fn handles_survive_a_round_trip_through_their_raw_identity() {
        let table = HandleTable::default();
        let handle = table.allocate(());

        assert_eq!(Some(handle), Handle::from_raw(handle.get()));
        assert_eq!(None, Handle::from_raw(0));
    }

    #[test]
    fn concurrent_allocations_yield_distinct_live_handles() {
        let table = Arc::new(HandleTable::default());

        let workers = (0..4)
            .map(|worker| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    (0..100)
                        .map(|i| {
                            let handle = table.allocate(worker * 1000 + i);
                            assert_eq!(Ok(worker * 1000 + i), table.resolve(handle));
                            handle
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();

        let mut handles = workers
            .into_iter()
            .flat_map(|worker| worker.join().expect("worker does not panic"))
            .collect::<Vec<_>>();
        handles.sort();
        handles.dedup();

        assert_eq!(400, handles.len());
        assert_eq!(400, table.len());

        for handle in handles {
            assert!(table.release(handle).is_ok());
        }
        assert!(table.is_empty());
    }
}
