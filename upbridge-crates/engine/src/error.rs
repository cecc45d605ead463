use thiserror::Error;
use upbridge_core::BridgeError;

#[cfg(doc)]
use crate::Solver;

/// Errors related to adding assertions to, and solving with, the [`Solver`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// An assertion was added while the [`Solver`] was in an infeasible state.
    #[error("Adding the assertion failed because the solver is in an infeasible state")]
    InfeasibleState,
    /// The term cannot be asserted or encoded by the [`Solver`].
    #[error("The term {0} is not supported")]
    UnsupportedTerm(String),
}
