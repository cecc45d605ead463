use crate::terms::Term;
use crate::terms::TermStore;
use crate::BridgeError;

/// The operations an engine offers to a handler for the duration of one callback.
///
/// An engine creates a value implementing this trait for every notification it sends and hands it
/// to the router; the handler reaches it through [`super::PropagatorContext`], which checks that
/// the operation is legal for the callback that is currently active.
pub trait SolverCallback {
    /// Registers `term` from this point of the search onward; the engine forgets the
    /// registration when it backtracks past the current scope.
    fn register_term(&mut self, term: Term);

    /// Offers the fact `fixed ∧ (lhs = rhs for every pair) → consequence` to the engine.
    ///
    /// Returns whether it was accepted; a rejection is not an error.
    fn propagate_consequence(
        &mut self,
        fixed: &[Term],
        equalities: &[(Term, Term)],
        consequence: Term,
    ) -> bool;

    /// Replaces the pending decision by a decision on bit `bit_index` of `term`.
    fn next_split(&mut self, term: Term, bit_index: u32, phase: Phase) -> bool;

    fn terms(&mut self) -> &mut TermStore;
}

/// The value a decision override prefers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Phase {
    False,
    /// Leave the choice of value to the engine.
    #[default]
    Default,
    True,
}

impl TryFrom<i32> for Phase {
    type Error = BridgeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Phase::False),
            0 => Ok(Phase::Default),
            1 => Ok(Phase::True),
            _ => Err(BridgeError::InvalidArgument(format!(
                "a phase is encoded as -1, 0 or 1, not {value}"
            ))),
        }
    }
}

impl From<Phase> for i32 {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::False => -1,
            Phase::Default => 0,
            Phase::True => 1,
        }
    }
}

impl From<bool> for Phase {
    fn from(value: bool) -> Self {
        if value {
            Phase::True
        } else {
            Phase::False
        }
    }
}

impl Phase {
    /// The preferred value, or `None` when the engine may choose.
    pub fn preferred_value(self) -> Option<bool> {
        match self {
            Phase::False => Some(false),
            Phase::Default => None,
            Phase::True => Some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_use_the_three_valued_encoding() {
        for phase in [Phase::False, Phase::Default, Phase::True] {
            assert_eq!(Ok(phase), Phase::try_from(i32::from(phase)));
        }
        assert!(matches!(
            Phase::try_from(2),
            Err(BridgeError::InvalidArgument(_))
        ));
    }
}
