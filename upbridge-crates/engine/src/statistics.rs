use upbridge_core::create_statistics_struct;

create_statistics_struct!(
    /// Counters of the search performed by a [`crate::Solver`].
    SolverStatistics {
        /// The number of decisions taken by the solver
        num_decisions: u64,
        /// The number of decisions replaced by a user propagator
        num_overridden_decisions: u64,
        num_conflicts: u64,
        num_learned_clauses: u64,
        /// The peak depth of the search tree
        peak_depth: u64,
        /// The number of consequences of user propagators added as clauses
        num_propagator_lemmas: u64,
        num_instantiations: u64,
        /// The number of quantifier instances blocked by a user propagator
        num_blocked_instantiations: u64,
        num_forks: u64,
});
