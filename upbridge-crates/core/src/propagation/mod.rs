//! User propagators: decision logic which takes part in the search of an engine.
//!
//! Code outside the engine implements [`UserPropagatorCallbacks`] and attaches it to an engine
//! context with [`UserPropagator::attach`], which places the handler in the process-wide handle
//! table and gives the engine only the resulting [`Handle`](crate::handles::Handle). From then on:
//! - The engine sends every notification through the functions of [`router`], passing the handle
//!   and a [`SolverCallback`] which is valid for that single call.
//! - The router hands the handler a [`PropagatorContext`]; it is the only way to register terms
//!   for part of the search, propagate consequences and override decisions, so these operations
//!   are impossible outside a callback.
//! - Scope changes are mirrored by the instance: terms registered inside a callback are forgotten
//!   when the scope they were registered in is popped.
//! - When the engine forks, [`router::fresh`] asks the handler for a clone and attaches it to the
//!   derived context.
//!
//! Which optional notifications a handler receives depends on two things: the capabilities it
//! asked the engine for (e.g. [`UserPropagator::register_fixed`]) and the capabilities it
//! implements (see [`UserPropagatorCallbacks`]).
mod callback;
mod capability;
mod context;
mod dispatch_statistics;
mod engine_context;
mod handler;
mod instance;
pub mod router;

pub use callback::*;
pub use capability::*;
pub use context::*;
pub use dispatch_statistics::DispatchStatistics;
pub use engine_context::*;
pub use handler::FinalHandler;
pub use handler::CreatedHandler;
pub use handler::DecideHandler;
pub use handler::DiseqHandler;
pub use handler::EqHandler;
pub use handler::FixedHandler;
pub use handler::OnBindingHandler;
pub use handler::UserPropagatorCallbacks;
pub(crate) use instance::Attachment;
pub(crate) use instance::PropagatorState;
pub use instance::UserPropagator;

use crate::terms::FuncDecl;
use crate::terms::Sort;
use crate::terms::Term;
use crate::BridgeError;

/// Only Boolean and bit-vector terms can be registered.
pub(crate) fn check_registrable(term: Term) -> Result<(), BridgeError> {
    if term.sort().is_registrable() {
        Ok(())
    } else {
        Err(BridgeError::InvalidArgument(format!(
            "only Boolean and bit-vector terms can be registered, not terms of sort {}",
            term.sort()
        )))
    }
}

/// Declares a function of `engine` whose applications are announced to the attached propagator
/// through the created event whenever the engine internalises one.
pub fn declare_function(
    engine: &mut dyn EngineContext,
    name: &str,
    domain: &[Sort],
    range: Sort,
) -> Result<FuncDecl, BridgeError> {
    engine
        .terms()
        .declare_propagated_function(name, domain, range)
}
