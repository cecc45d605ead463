use downcast_rs::impl_downcast;
use downcast_rs::Downcast;

use super::Capability;
use super::CapabilitySet;
use super::FreshContext;
use super::PropagatorContext;
use crate::terms::Term;

// Allows `UserPropagator::with_handler` to hand out the concrete handler type.
impl_downcast!(UserPropagatorCallbacks);

/// Decision logic which takes part in the search of an engine.
///
/// The scope and fork callbacks are required. Every optional notification has its own trait
/// ([`FixedHandler`], [`FinalHandler`], [`EqHandler`], [`DiseqHandler`], [`CreatedHandler`],
/// [`DecideHandler`] and [`OnBindingHandler`]); a handler announces that it implements one by
/// overriding the matching `as_*` method to return `Some(self)`. The router asks once, when the
/// handler is attached, and uses the default of the notification for every capability which is
/// not implemented: nothing happens, except for [`OnBindingHandler`] where the binding is allowed.
///
/// # Example
/// ```rust
/// # use upbridge_core::propagation::*;
/// # use upbridge_core::terms::Term;
/// #[derive(Default)]
/// struct CountFixed {
///     fixed: usize,
/// }
///
/// impl UserPropagatorCallbacks for CountFixed {
///     fn push(&mut self) {}
///
///     fn pop(&mut self, _num_scopes: u32) {}
///
///     fn fresh(&mut self, _context: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks> {
///         Box::new(CountFixed::default())
///     }
///
///     fn as_fixed(&mut self) -> Option<&mut dyn FixedHandler> {
///         Some(self)
///     }
/// }
///
/// impl FixedHandler for CountFixed {
///     fn fixed(&mut self, _context: &mut PropagatorContext<'_>, _term: Term, _value: Term) {
///         self.fixed += 1;
///     }
/// }
/// ```
pub trait UserPropagatorCallbacks: Downcast + Send {
    /// Used when logging.
    fn name(&self) -> &str {
        "UserPropagator"
    }

    /// Called whenever the engine opens a new backtracking scope.
    ///
    /// Hard errors must be reported out of band; the search continues.
    fn push(&mut self);

    /// Called when the engine closes the `num_scopes` innermost scopes at once; `num_scopes` is
    /// at least one. Any state tied to those scopes should be discarded.
    fn pop(&mut self, num_scopes: u32);

    /// Called exactly once when the engine derives a new search context from the one this
    /// handler is attached to. The returned handler is attached to the new context, which receives
    /// every capability this handler's propagator had enabled.
    ///
    /// Terms of the new context are created through [`FreshContext::terms`], and must be
    /// registered again with [`FreshContext::add`].
    fn fresh(&mut self, context: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks>;

    fn as_fixed(&mut self) -> Option<&mut dyn FixedHandler> {
        None
    }

    fn as_final(&mut self) -> Option<&mut dyn FinalHandler> {
        None
    }

    fn as_eq(&mut self) -> Option<&mut dyn EqHandler> {
        None
    }

    fn as_diseq(&mut self) -> Option<&mut dyn DiseqHandler> {
        None
    }

    fn as_created(&mut self) -> Option<&mut dyn CreatedHandler> {
        None
    }

    fn as_decide(&mut self) -> Option<&mut dyn DecideHandler> {
        None
    }

    fn as_on_binding(&mut self) -> Option<&mut dyn OnBindingHandler> {
        None
    }
}

/// A registered term has been assigned `value`.
pub trait FixedHandler {
    fn fixed(&mut self, context: &mut PropagatorContext<'_>, term: Term, value: Term);
}

/// Every variable of the engine has been assigned; the last chance to reject the assignment.
pub trait FinalHandler {
    fn final_check(&mut self, context: &mut PropagatorContext<'_>);
}

pub trait EqHandler {
    fn equality(&mut self, context: &mut PropagatorContext<'_>, lhs: Term, rhs: Term);
}

pub trait DiseqHandler {
    fn disequality(&mut self, context: &mut PropagatorContext<'_>, lhs: Term, rhs: Term);
}

/// An application of a declared propagator function has been internalised.
pub trait CreatedHandler {
    fn created(&mut self, context: &mut PropagatorContext<'_>, term: Term);
}

/// The engine is about to decide bit `bit_index` of `term` to `phase`; the decision may be
/// replaced with [`PropagatorContext::next_split`].
pub trait DecideHandler {
    fn decide(
        &mut self,
        context: &mut PropagatorContext<'_>,
        term: Term,
        bit_index: u32,
        phase: bool,
    );
}

/// The engine proposes `instance` as an instance of `quantifier`; returning `false` blocks it.
pub trait OnBindingHandler {
    fn on_binding(
        &mut self,
        context: &mut PropagatorContext<'_>,
        quantifier: Term,
        instance: Term,
    ) -> bool;
}

/// The optional capabilities `handler` implements.
pub(crate) fn probe_capabilities(handler: &mut dyn UserPropagatorCallbacks) -> CapabilitySet {
    let mut implemented = CapabilitySet::empty();
    let probes: [(Capability, bool); 7] = [
        (Capability::Fixed, handler.as_fixed().is_some()),
        (Capability::Final, handler.as_final().is_some()),
        (Capability::Eq, handler.as_eq().is_some()),
        (Capability::Diseq, handler.as_diseq().is_some()),
        (Capability::Created, handler.as_created().is_some()),
        (Capability::Decide, handler.as_decide().is_some()),
        (Capability::OnBinding, handler.as_on_binding().is_some()),
    ];

    for (capability, is_implemented) in probes {
        if is_implemented {
            let _ = implemented.insert(capability);
        }
    }

    implemented
}
