#[cfg(doc)]
use crate::termination::TerminationCondition;
#[cfg(doc)]
use crate::Solver;

/// The result of a call to [`Solver::solve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SatisfactionResult {
    /// The assertions are satisfiable; the model can be queried with [`Solver::bool_value`] and
    /// [`Solver::bv_value`] until the solver backtracks.
    Satisfiable,
    Unsatisfiable,
    /// It is not known whether the assertions are satisfiable, because a
    /// [`TerminationCondition`] triggered.
    Unknown,
}
