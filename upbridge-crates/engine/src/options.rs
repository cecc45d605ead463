/// The value a decision assigns when no user propagator overrides it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DefaultPhase {
    #[default]
    False,
    True,
}

impl DefaultPhase {
    pub(crate) fn value(self) -> bool {
        matches!(self, DefaultPhase::True)
    }
}

/// Options for the [`crate::Solver`] which determine how it behaves.
#[derive(Clone, Debug)]
pub struct SolverOptions {
    /// The seed of the random generator used when [`SolverOptions::random_decisions`] is set.
    pub random_seed: u64,
    /// Whether to decide on variables in a random order rather than in the order they were
    /// created.
    pub random_decisions: bool,
    pub default_phase: DefaultPhase,
    /// Whether clause observers receive the rule by which each clause was derived.
    pub proof_hints: bool,
    /// The maximum number of instances created for a single quantified assertion.
    pub max_instances_per_quantifier: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            random_seed: 42,
            random_decisions: false,
            default_phase: DefaultPhase::default(),
            proof_hints: true,
            max_instances_per_quantifier: 64,
        }
    }
}
