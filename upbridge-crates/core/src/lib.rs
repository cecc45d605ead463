//! The boundary through which user-supplied decision logic takes part in the search of an engine.
//!
//! The crate is organised around the objects which cross the boundary:
//! - [`handles`]: the process-wide table of opaque identities, which is all an engine ever holds.
//! - [`propagation`]: user propagators; attachment, the callback context and the router which
//!   delivers engine notifications to the optional capabilities a handler implements.
//! - [`observer`]: clause observers, which receive every clause an engine adds.
//!
//! Engines implement [`propagation::EngineContext`] and [`propagation::SolverCallback`] and
//! drive the boundary through [`propagation::router`] and [`observer::notify_clause`].
pub mod basic_types;
pub mod containers;
pub mod handles;
pub mod observer;
pub mod propagation;
pub mod statistics;
pub mod terms;
pub mod upbridge_asserts;

mod error;
mod test_engine;

pub use convert_case;

pub use crate::basic_types::Trail;
pub use crate::error::BridgeError;
pub use crate::handles::Handle;
