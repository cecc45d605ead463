use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::TryLockError;

use log::debug;
use log::warn;

use super::check_registrable;
use super::handler::probe_capabilities;
use super::Capability;
use super::CapabilitySet;
use super::DispatchStatistics;
use super::EngineContext;
use super::EventKind;
use super::Phase;
use super::SearchActivity;
use super::UserPropagatorCallbacks;
use crate::basic_types::Trail;
use crate::containers::HashSet;
use crate::handles::registry;
use crate::handles::Handle;
use crate::handles::Registered;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;
use crate::terms::Term;
use crate::BridgeError;

/// The boundary-side state of one attached propagator.
#[derive(Debug)]
pub(crate) struct PropagatorState {
    /// The capabilities the engine was asked to deliver.
    pub(crate) enabled: CapabilitySet,
    /// The capabilities the handler implements, probed once at attachment.
    pub(crate) implemented: CapabilitySet,
    /// The event being delivered, if any.
    pub(crate) active: Option<EventKind>,
    /// Terms registered inside callbacks, partitioned by the scope in which they were registered.
    /// The number of scopes of this trail is the scope depth of the instance.
    pub(crate) scoped_terms: Trail<Term>,
    pub(crate) global_terms: HashSet<Term>,
    pub(crate) statistics: DispatchStatistics,
}

impl PropagatorState {
    pub(crate) fn is_registered(&self, term: Term) -> bool {
        self.global_terms.contains(&term) || self.scoped_terms.contains(&term)
    }
}

pub(crate) struct Attachment {
    pub(crate) handler: Box<dyn UserPropagatorCallbacks>,
    pub(crate) state: PropagatorState,
}

impl Debug for Attachment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("handler", &self.handler.name())
            .field("state", &self.state)
            .finish()
    }
}

/// Locks an attachment without blocking; a dispatch may never wait for another one.
pub(crate) fn lock_attachment(
    attachment: &Mutex<Attachment>,
) -> Result<MutexGuard<'_, Attachment>, BridgeError> {
    match attachment.try_lock() {
        Ok(guard) => Ok(guard),
        Err(TryLockError::WouldBlock) => Err(BridgeError::IllegalState(
            "the propagator is already inside a callback",
        )),
        Err(TryLockError::Poisoned(_)) => Err(BridgeError::IllegalState(
            "a handler of the propagator panicked inside a callback",
        )),
    }
}

pub(crate) fn resolve_propagator(handle: Handle) -> Result<Arc<Mutex<Attachment>>, BridgeError> {
    match registry().resolve(handle)? {
        Registered::Propagator(attachment) => Ok(attachment),
        Registered::Observer(_) => Err(BridgeError::InvalidHandle(handle)),
    }
}

/// A user propagator attached to an engine context.
///
/// The attaching code owns this value; the engine only holds its [`Handle`]. The handle stays
/// valid until [`UserPropagator::close`] is called or the value is dropped, and is never reused.
pub struct UserPropagator {
    handle: Handle,
    attachment: Arc<Mutex<Attachment>>,
    search: SearchActivity,
    released: bool,
}

impl Debug for UserPropagator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPropagator")
            .field("handle", &self.handle)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl UserPropagator {
    /// Attaches `handler` to `engine`; only one propagator can be attached to an engine context
    /// at a time.
    pub fn attach(
        engine: &mut dyn EngineContext,
        handler: impl UserPropagatorCallbacks,
    ) -> Result<UserPropagator, BridgeError> {
        UserPropagator::attach_boxed(engine, Box::new(handler))
    }

    pub fn attach_boxed(
        engine: &mut dyn EngineContext,
        mut handler: Box<dyn UserPropagatorCallbacks>,
    ) -> Result<UserPropagator, BridgeError> {
        let implemented = probe_capabilities(handler.as_mut());
        let name = handler.name().to_owned();

        let attachment = Arc::new(Mutex::new(Attachment {
            handler,
            state: PropagatorState {
                enabled: CapabilitySet::empty(),
                implemented,
                active: None,
                scoped_terms: Trail::default(),
                global_terms: HashSet::default(),
                statistics: DispatchStatistics::default(),
            },
        }));
        let handle = registry().allocate(Registered::Propagator(Arc::clone(&attachment)));

        if let Err(error) = engine.propagate_init(handle) {
            let _ = registry().release(handle);
            return Err(error);
        }

        debug!("Attached '{name}' as {handle} implementing {implemented:?}");
        Ok(UserPropagator {
            handle,
            attachment,
            search: engine.search_activity(),
            released: false,
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    fn lock(&self) -> Result<MutexGuard<'_, Attachment>, BridgeError> {
        if self.released {
            return Err(BridgeError::InvalidHandle(self.handle));
        }
        lock_attachment(&self.attachment)
    }

    /// Asks `engine` to deliver the events of `capability`.
    ///
    /// A handler which does not implement the capability receives the default behaviour of the
    /// event.
    pub fn register_capability(
        &self,
        engine: &mut dyn EngineContext,
        capability: Capability,
    ) -> Result<(), BridgeError> {
        let mut attachment = self.lock()?;
        if !attachment.state.implemented.contains(capability) {
            warn!(
                "'{}' registered for {} events without implementing them",
                attachment.handler.name(),
                capability.name()
            );
        }
        let _ = attachment.state.enabled.insert(capability);
        engine.propagate_enable(self.handle, capability);
        Ok(())
    }

    pub fn register_fixed(&self, engine: &mut dyn EngineContext) -> Result<(), BridgeError> {
        self.register_capability(engine, Capability::Fixed)
    }

    pub fn register_final(&self, engine: &mut dyn EngineContext) -> Result<(), BridgeError> {
        self.register_capability(engine, Capability::Final)
    }

    pub fn register_eq(&self, engine: &mut dyn EngineContext) -> Result<(), BridgeError> {
        self.register_capability(engine, Capability::Eq)
    }

    pub fn register_diseq(&self, engine: &mut dyn EngineContext) -> Result<(), BridgeError> {
        self.register_capability(engine, Capability::Diseq)
    }

    pub fn register_created(&self, engine: &mut dyn EngineContext) -> Result<(), BridgeError> {
        self.register_capability(engine, Capability::Created)
    }

    pub fn register_decide(&self, engine: &mut dyn EngineContext) -> Result<(), BridgeError> {
        self.register_capability(engine, Capability::Decide)
    }

    pub fn register_on_binding(&self, engine: &mut dyn EngineContext) -> Result<(), BridgeError> {
        self.register_capability(engine, Capability::OnBinding)
    }

    /// Registers `term` for the whole search.
    ///
    /// Inside a callback, use [`super::PropagatorContext::add`] instead.
    pub fn add(&self, engine: &mut dyn EngineContext, term: Term) -> Result<(), BridgeError> {
        check_registrable(term)?;
        let mut attachment = self.lock()?;
        if attachment.state.global_terms.insert(term) {
            engine.propagate_register(self.handle, term);
        }
        Ok(())
    }

    /// Consequences can only be propagated through the context of an active callback, so this
    /// always fails with [`BridgeError::IllegalState`].
    pub fn consequence(&self, _fixed: &[Term], _consequence: Term) -> Result<bool, BridgeError> {
        drop(self.lock()?);
        Err(BridgeError::IllegalState(
            "consequences can only be propagated inside a callback",
        ))
    }

    /// See [`UserPropagator::consequence`].
    pub fn consequence_with_eqs(
        &self,
        _fixed: &[Term],
        _lhs: &[Term],
        _rhs: &[Term],
        _consequence: Term,
    ) -> Result<bool, BridgeError> {
        drop(self.lock()?);
        Err(BridgeError::IllegalState(
            "consequences can only be propagated inside a callback",
        ))
    }

    /// Decisions can only be overridden while a decision is delivered, so this always fails with
    /// [`BridgeError::IllegalState`].
    pub fn next_split(
        &self,
        _term: Term,
        _bit_index: u32,
        _phase: Phase,
    ) -> Result<bool, BridgeError> {
        drop(self.lock()?);
        Err(BridgeError::IllegalState(
            "a decision can only be overridden while a decision is being delivered",
        ))
    }

    /// Runs `f` on the handler, which must be of type `Handler`.
    pub fn with_handler<Handler: UserPropagatorCallbacks, R>(
        &self,
        f: impl FnOnce(&mut Handler) -> R,
    ) -> Result<R, BridgeError> {
        let mut attachment = self.lock()?;
        let handler = attachment
            .handler
            .downcast_mut::<Handler>()
            .ok_or_else(|| {
                BridgeError::InvalidArgument(format!(
                    "the handler of {} is not a {}",
                    self.handle,
                    std::any::type_name::<Handler>()
                ))
            })?;
        Ok(f(handler))
    }

    pub fn scope_depth(&self) -> Result<usize, BridgeError> {
        Ok(self.lock()?.state.scoped_terms.scope())
    }

    pub fn is_registered(&self, term: Term) -> Result<bool, BridgeError> {
        Ok(self.lock()?.state.is_registered(term))
    }

    pub fn enabled_capabilities(&self) -> Result<CapabilitySet, BridgeError> {
        Ok(self.lock()?.state.enabled)
    }

    pub fn implemented_capabilities(&self) -> Result<CapabilitySet, BridgeError> {
        Ok(self.lock()?.state.implemented)
    }

    pub fn statistics(&self) -> Result<DispatchStatistics, BridgeError> {
        Ok(self.lock()?.state.statistics)
    }

    pub fn log_statistics(&self, statistic_logger: StatisticLogger) -> Result<(), BridgeError> {
        let attachment = self.lock()?;
        attachment
            .state
            .statistics
            .log(statistic_logger.attach_to_prefix(attachment.handler.name()));
        Ok(())
    }

    /// Detaches the propagator and releases its handle.
    ///
    /// Fails with [`BridgeError::IllegalState`] while the propagator is inside a callback or its
    /// engine context is searching.
    pub fn close(&mut self) -> Result<(), BridgeError> {
        if self.search.is_active() {
            return Err(BridgeError::IllegalState(
                "a propagator cannot be closed while its engine is searching",
            ));
        }
        drop(self.lock()?);

        let _ = registry().release(self.handle)?;
        self.released = true;
        debug!("Closed {}", self.handle);
        Ok(())
    }
}

impl Drop for UserPropagator {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(error) = self.close() {
            warn!("{} was dropped without being released: {error}", self.handle);
        }
    }
}
