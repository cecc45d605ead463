//! The entry points through which an engine notifies the propagator behind a [`Handle`].
//!
//! Every function resolves the handle, marks the event as the active callback of the instance for
//! the duration of the call (restoring whatever was active before), and forwards the event to the
//! handler when it implements the matching capability. Unimplemented capabilities fall back to
//! their default: nothing happens, except for [`on_binding`], which allows the binding.
//!
//! A dispatch never waits: reaching an instance which is already delivering an event fails with
//! [`BridgeError::IllegalState`].
use log::debug;
use log::trace;

use super::instance::lock_attachment;
use super::instance::resolve_propagator;
use super::Attachment;
use super::Capability;
use super::EngineContext;
use super::EventKind;
use super::FreshContext;
use super::PropagatorContext;
use super::SolverCallback;
use super::UserPropagator;
use crate::handles::Handle;
use crate::terms::Term;
use crate::BridgeError;

fn with_instance<R>(
    handle: Handle,
    event: EventKind,
    body: impl FnOnce(&mut Attachment) -> R,
) -> Result<R, BridgeError> {
    let attachment = resolve_propagator(handle)?;
    let mut guard = lock_attachment(&attachment)?;

    trace!("Dispatching {} to {handle}", event.name());
    guard.state.statistics.record(event);
    let previous = guard.state.active.replace(event);
    let result = body(&mut guard);
    guard.state.active = previous;

    Ok(result)
}

/// The engine opened a scope.
pub fn push(handle: Handle) -> Result<(), BridgeError> {
    with_instance(handle, EventKind::Push, |attachment| {
        attachment.state.scoped_terms.new_scope();
        attachment.handler.push();
    })
}

/// The engine closed the `num_scopes` innermost scopes.
///
/// Fails with [`BridgeError::InvalidArgument`] when `num_scopes` is zero and with
/// [`BridgeError::IllegalState`] when fewer scopes are open.
pub fn pop(handle: Handle, num_scopes: u32) -> Result<(), BridgeError> {
    if num_scopes == 0 {
        return Err(BridgeError::InvalidArgument(
            "at least one scope is popped at a time".to_owned(),
        ));
    }

    with_instance(handle, EventKind::Pop, |attachment| {
        let depth = attachment.state.scoped_terms.scope();
        if num_scopes as usize > depth {
            return Err(BridgeError::IllegalState(
                "cannot pop more scopes than have been pushed",
            ));
        }

        let _ = attachment
            .state
            .scoped_terms
            .pop_scopes(num_scopes as usize)
            .count();
        attachment.handler.pop(num_scopes);
        Ok(())
    })?
}

/// The engine derived the context `child` from the context the propagator behind `parent` is
/// attached to.
///
/// The handler is asked for a clone exactly once; the clone is attached to `child` with every
/// capability enabled on `parent`, and the resulting propagator is returned for the child context
/// to own. Capabilities of the clone are probed anew rather than copied.
pub fn fresh(parent: Handle, child: &mut dyn EngineContext) -> Result<UserPropagator, BridgeError> {
    let (clone, enabled, pending) = with_instance(parent, EventKind::Fresh, |attachment| {
        let mut context = FreshContext::new(&mut *child);
        let clone = attachment.handler.fresh(&mut context);
        (clone, attachment.state.enabled, context.into_pending())
    })?;

    let propagator = UserPropagator::attach_boxed(child, clone)?;
    for capability in enabled {
        propagator.register_capability(child, capability)?;
    }
    for term in pending {
        propagator.add(child, term)?;
    }

    debug!("Forked {parent} into {}", propagator.handle());
    Ok(propagator)
}

/// The registered `term` has been assigned `value`.
pub fn fixed(
    handle: Handle,
    callback: &mut dyn SolverCallback,
    term: Term,
    value: Term,
) -> Result<(), BridgeError> {
    with_instance(handle, EventKind::Fixed, |attachment| {
        let Attachment { handler, state } = attachment;
        if !state.implemented.contains(Capability::Fixed) {
            return;
        }
        if let Some(handler) = handler.as_fixed() {
            handler.fixed(&mut PropagatorContext::new(state, callback), term, value);
        }
    })
}

pub fn final_check(handle: Handle, callback: &mut dyn SolverCallback) -> Result<(), BridgeError> {
    with_instance(handle, EventKind::Final, |attachment| {
        let Attachment { handler, state } = attachment;
        if !state.implemented.contains(Capability::Final) {
            return;
        }
        if let Some(handler) = handler.as_final() {
            handler.final_check(&mut PropagatorContext::new(state, callback));
        }
    })
}

pub fn equality(
    handle: Handle,
    callback: &mut dyn SolverCallback,
    lhs: Term,
    rhs: Term,
) -> Result<(), BridgeError> {
    with_instance(handle, EventKind::Eq, |attachment| {
        let Attachment { handler, state } = attachment;
        if !state.implemented.contains(Capability::Eq) {
            return;
        }
        if let Some(handler) = handler.as_eq() {
            handler.equality(&mut PropagatorContext::new(state, callback), lhs, rhs);
        }
    })
}

pub fn disequality(
    handle: Handle,
    callback: &mut dyn SolverCallback,
    lhs: Term,
    rhs: Term,
) -> Result<(), BridgeError> {
    with_instance(handle, EventKind::Diseq, |attachment| {
        let Attachment { handler, state } = attachment;
        if !state.implemented.contains(Capability::Diseq) {
            return;
        }
        if let Some(handler) = handler.as_diseq() {
            handler.disequality(&mut PropagatorContext::new(state, callback), lhs, rhs);
        }
    })
}

pub fn created(
    handle: Handle,
    callback: &mut dyn SolverCallback,
    term: Term,
) -> Result<(), BridgeError> {
    with_instance(handle, EventKind::Created, |attachment| {
        let Attachment { handler, state } = attachment;
        if !state.implemented.contains(Capability::Created) {
            return;
        }
        if let Some(handler) = handler.as_created() {
            handler.created(&mut PropagatorContext::new(state, callback), term);
        }
    })
}

/// The engine is about to decide bit `bit_index` of `term` to `phase`.
pub fn decide(
    handle: Handle,
    callback: &mut dyn SolverCallback,
    term: Term,
    bit_index: u32,
    phase: bool,
) -> Result<(), BridgeError> {
    with_instance(handle, EventKind::Decide, |attachment| {
        let Attachment { handler, state } = attachment;
        if !state.implemented.contains(Capability::Decide) {
            return;
        }
        if let Some(handler) = handler.as_decide() {
            handler.decide(
                &mut PropagatorContext::new(state, callback),
                term,
                bit_index,
                phase,
            );
        }
    })
}

/// Whether `instance` of `quantifier` may be asserted; `true` unless the handler objects.
pub fn on_binding(
    handle: Handle,
    callback: &mut dyn SolverCallback,
    quantifier: Term,
    instance: Term,
) -> Result<bool, BridgeError> {
    with_instance(handle, EventKind::OnBinding, |attachment| {
        let Attachment { handler, state } = attachment;
        if !state.implemented.contains(Capability::OnBinding) {
            return true;
        }
        let Some(handler) = handler.as_on_binding() else {
            return true;
        };

        let allowed = handler.on_binding(
            &mut PropagatorContext::new(state, callback),
            quantifier,
            instance,
        );
        if !allowed {
            state.statistics.bindings_blocked += 1;
        }
        allowed
    })
}
