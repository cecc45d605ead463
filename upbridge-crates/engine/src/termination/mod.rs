//! A [`TerminationCondition`] is polled by the solver during search. It indicates when the solver
//! should stop, even if no definitive conclusion has been reached.
mod conflict_budget;
mod indefinite;

pub use conflict_budget::ConflictBudget;
pub use indefinite::Indefinite;

/// Determines when the solver should give up searching.
pub trait TerminationCondition {
    /// Returns `true` when the solver should stop, `false` otherwise.
    fn should_stop(&mut self) -> bool;

    fn conflict_has_been_found(&mut self) {}
}

impl<T: TerminationCondition> TerminationCondition for Option<T> {
    fn should_stop(&mut self) -> bool {
        match self {
            Some(t) => t.should_stop(),
            None => false,
        }
    }

    fn conflict_has_been_found(&mut self) {
        if let Some(t) = self {
            t.conflict_has_been_found()
        }
    }
}
