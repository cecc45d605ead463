//! Observation of the clauses an engine adds to its database.
//!
//! A clause observer is independent of any user propagator: it is registered with
//! [`OnClause::observe`] and receives every clause through [`notify_clause`], in the order the
//! engine adds them. The position of a clause in that order is its index, which later clauses
//! refer to in their [`ClauseRecord::dependencies`].
mod clause_record;

use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::TryLockError;

pub use clause_record::*;
use log::debug;
use log::trace;
use log::warn;

use crate::handles::registry;
use crate::handles::Handle;
use crate::handles::Registered;
use crate::propagation::EngineContext;
use crate::propagation::SearchActivity;
use crate::BridgeError;

/// Receives the clauses of an engine.
pub trait ClauseHandler: Send {
    fn on_clause(&mut self, clause: &ClauseRecord<'_>);
}

impl<F: FnMut(&ClauseRecord<'_>) + Send> ClauseHandler for F {
    fn on_clause(&mut self, clause: &ClauseRecord<'_>) {
        self(clause)
    }
}

pub(crate) struct ObserverSlot {
    handler: Box<dyn ClauseHandler>,
    delivered: u64,
}

/// A clause observer registered with an engine context.
pub struct OnClause {
    handle: Handle,
    slot: Arc<Mutex<ObserverSlot>>,
    search: SearchActivity,
    released: bool,
}

impl Debug for OnClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnClause")
            .field("handle", &self.handle)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl OnClause {
    pub fn observe(
        engine: &mut dyn EngineContext,
        handler: impl ClauseHandler + 'static,
    ) -> Result<OnClause, BridgeError> {
        let slot = Arc::new(Mutex::new(ObserverSlot {
            handler: Box::new(handler),
            delivered: 0,
        }));
        let handle = registry().allocate(Registered::Observer(Arc::clone(&slot)));

        if let Err(error) = engine.register_on_clause(handle) {
            let _ = registry().release(handle);
            return Err(error);
        }

        debug!("Registered clause observer {handle}");
        Ok(OnClause {
            handle,
            slot,
            search: engine.search_activity(),
            released: false,
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// The number of clauses delivered so far.
    pub fn clauses_delivered(&self) -> Result<u64, BridgeError> {
        if self.released {
            return Err(BridgeError::InvalidHandle(self.handle));
        }
        Ok(lock_slot(&self.slot)?.delivered)
    }

    /// Unregisters the observer from `engine` and releases its handle.
    ///
    /// Fails with [`BridgeError::IllegalState`] while a clause is being delivered or the engine
    /// is searching.
    pub fn close(&mut self, engine: &mut dyn EngineContext) -> Result<(), BridgeError> {
        self.release()?;
        engine.unregister_on_clause(self.handle);
        Ok(())
    }

    fn release(&mut self) -> Result<(), BridgeError> {
        if self.released {
            return Err(BridgeError::InvalidHandle(self.handle));
        }
        if self.search.is_active() {
            return Err(BridgeError::IllegalState(
                "a clause observer cannot be closed while its engine is searching",
            ));
        }
        drop(lock_slot(&self.slot)?);

        let _ = registry().release(self.handle)?;
        self.released = true;
        debug!("Closed clause observer {}", self.handle);
        Ok(())
    }
}

impl Drop for OnClause {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(error) = self.release() {
            warn!("{} was dropped without being released: {error}", self.handle);
        }
    }
}

fn lock_slot(
    slot: &Mutex<ObserverSlot>,
) -> Result<std::sync::MutexGuard<'_, ObserverSlot>, BridgeError> {
    match slot.try_lock() {
        Ok(guard) => Ok(guard),
        Err(TryLockError::WouldBlock) => Err(BridgeError::IllegalState(
            "the clause observer is already receiving a clause",
        )),
        Err(TryLockError::Poisoned(_)) => Err(BridgeError::IllegalState(
            "the clause observer panicked while receiving a clause",
        )),
    }
}

/// Delivers `clause` to the observer behind `handle`.
pub fn notify_clause(handle: Handle, clause: &ClauseRecord<'_>) -> Result<(), BridgeError> {
    let Registered::Observer(slot) = registry().resolve(handle)? else {
        return Err(BridgeError::InvalidHandle(handle));
    };
    let mut slot = lock_slot(&slot)?;

    trace!(
        "Delivering a clause of {} literals to {handle}",
        clause.literals().len()
    );
    slot.handler.on_clause(clause);
    slot.delivered += 1;
    Ok(())
}
