use log::debug;
use log::info;
use log::warn;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use upbridge_core::observer::ProofHint;
use upbridge_core::propagation::router;
use upbridge_core::propagation::Capability;
use upbridge_core::propagation::EngineContext;
use upbridge_core::propagation::SearchActivity;
use upbridge_core::propagation::UserPropagator;
use upbridge_core::statistics::log_statistic_postfix;
use upbridge_core::statistics::Statistic;
use upbridge_core::statistics::StatisticLogger;
use upbridge_core::terms::Sort;
use upbridge_core::terms::Term;
use upbridge_core::terms::TermStore;
use upbridge_core::BridgeError;
use upbridge_core::Handle;

use crate::encoding::Encoding;
use crate::quantifiers::Quantifiers;
use crate::sat::Assignments;
use crate::sat::ClauseDatabase;
use crate::sat::ConflictAnalyser;
use crate::sat::Literal;
use crate::sat::Variable;
use crate::search::PendingClauses;
use crate::user_propagator::UserHookup;
use crate::SolverError;
use crate::SolverOptions;
use crate::SolverStatistics;

/// A backtracking search engine over Boolean and bit-vector assertions which user propagators
/// and clause observers can take part in.
///
/// The solver is the engine context the boundary talks about: propagators attach to it through
/// [`UserPropagator::attach`] and observers through
/// [`OnClause::observe`](upbridge_core::observer::OnClause::observe), both of which take the
/// solver as their [`EngineContext`].
///
/// # Example
/// ```rust
/// # use upbridge_engine::Solver;
/// # use upbridge_engine::SatisfactionResult;
/// # use upbridge_engine::termination::Indefinite;
/// let mut solver = Solver::default();
/// let x = solver.terms().mk_bool_const("x");
/// let y = solver.terms().mk_bool_const("y");
/// let not_y = solver.terms().mk_not(y).unwrap();
/// let clause = solver.terms().mk_or(&[x, not_y]).unwrap();
///
/// solver.assert(clause).unwrap();
/// solver.assert(y).unwrap();
///
/// assert_eq!(SatisfactionResult::Satisfiable, solver.solve(&mut Indefinite).unwrap());
/// assert_eq!(Some(true), solver.bool_value(x));
/// ```
#[derive(Debug)]
pub struct Solver {
    pub(crate) options: SolverOptions,
    pub(crate) terms: TermStore,
    pub(crate) assignments: Assignments,
    pub(crate) clauses: ClauseDatabase,
    pub(crate) analyser: ConflictAnalyser,
    pub(crate) encoding: Encoding,
    pub(crate) quantifiers: Quantifiers,
    pub(crate) pending_clauses: PendingClauses,
    /// The index the next clause delivered to the observers receives.
    pub(crate) next_clause_index: u64,
    pub(crate) decision_order: Vec<Variable>,
    pub(crate) rng: SmallRng,
    pub(crate) user: UserHookup,
    pub(crate) observers: Vec<Handle>,
    pub(crate) infeasible: bool,
    pub(crate) search: SearchActivity,
    pub(crate) statistics: SolverStatistics,
    assertions: Vec<Term>,
    /// The clone of the propagator of the solver this solver was forked from.
    forked: Option<UserPropagator>,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::with_options(SolverOptions::default())
    }
}

impl Solver {
    pub fn with_options(options: SolverOptions) -> Self {
        Solver::with_terms(options, TermStore::default())
    }

    fn with_terms(options: SolverOptions, mut terms: TermStore) -> Self {
        let true_term = terms.mk_true();
        let mut assignments = Assignments::default();
        let true_variable = assignments.new_variable();
        assignments.enqueue(Literal::new(true_variable, true), None);
        let mut clauses = ClauseDatabase::default();
        clauses.grow_to(1);

        Solver {
            rng: SmallRng::seed_from_u64(options.random_seed),
            options,
            terms,
            assignments,
            clauses,
            analyser: ConflictAnalyser::default(),
            encoding: Encoding::new(true_variable, true_term),
            quantifiers: Quantifiers::default(),
            pending_clauses: PendingClauses::default(),
            next_clause_index: 0,
            decision_order: Vec::new(),
            user: UserHookup::default(),
            observers: Vec::new(),
            infeasible: false,
            search: SearchActivity::default(),
            statistics: SolverStatistics::default(),
            assertions: Vec::new(),
            forked: None,
        }
    }

    /// The store in which the terms given to this solver are created.
    pub fn terms(&mut self) -> &mut TermStore {
        &mut self.terms
    }

    pub fn term_store(&self) -> &TermStore {
        &self.terms
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Adds a Boolean assertion, which holds in every later search.
    ///
    /// Fails with [`SolverError::InfeasibleState`] when the assertions are already known to be
    /// unsatisfiable, and with [`SolverError::UnsupportedTerm`] when the term cannot be encoded.
    pub fn assert(&mut self, term: Term) -> Result<(), SolverError> {
        if self.search.is_active() {
            return Err(
                BridgeError::IllegalState("assertions cannot be added during search").into(),
            );
        }
        if self.infeasible {
            return Err(SolverError::InfeasibleState);
        }

        self.backtrack(0)?;
        self.quantifiers.collect(&self.terms, term);
        let literal = self.literal(term)?;
        self.assertions.push(term);
        self.queue_clause(vec![literal], ProofHint::Asserted);

        if let Some(conflict) = self.integrate_pending()? {
            debug!("Asserting {} refutes the assertions", self.terms.display(term));
            let _ = self.resolve_conflict(conflict)?;
        }
        Ok(())
    }

    pub fn assertions(&self) -> &[Term] {
        &self.assertions
    }

    /// The value of a Boolean term in the last model, if the solver has assigned it.
    pub fn bool_value(&self, term: Term) -> Option<bool> {
        let literal = self.encoding.cached_literal(term)?;
        self.assignments.literal_value(literal)
    }

    /// The value of a bit-vector term in the last model, if the solver has assigned all of its
    /// bits.
    pub fn bv_value(&self, term: Term) -> Option<u64> {
        let Sort::BitVec(_) = term.sort() else {
            return None;
        };
        self.encoding
            .cached_bits(term)?
            .iter()
            .rev()
            .try_fold(0_u64, |value, &bit| {
                let bit = self.assignments.literal_value(bit)?;
                Some((value << 1) | bit as u64)
            })
    }

    /// Discards the last model by backtracking to the root.
    pub fn reset(&mut self) -> Result<(), SolverError> {
        if self.search.is_active() {
            return Err(
                BridgeError::IllegalState("the solver cannot be reset during search").into(),
            );
        }
        Ok(self.backtrack(0)?)
    }

    pub fn decision_level(&self) -> usize {
        self.assignments.decision_level()
    }

    /// Whether the assertions have been refuted.
    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    /// Derives an independent solver with the same assertions.
    ///
    /// When a user propagator is attached, it is asked for a clone which is attached to the new
    /// solver; the clone is owned by the new solver, see [`Solver::forked_propagator`]. Clause
    /// observers are not carried over.
    pub fn fork(&mut self) -> Result<Solver, SolverError> {
        if self.search.is_active() {
            return Err(
                BridgeError::IllegalState("the solver cannot be forked during search").into(),
            );
        }

        let mut child = Solver::with_terms(self.options.clone(), self.terms.clone());
        for &assertion in &self.assertions {
            child.assert(assertion)?;
        }

        self.user.drop_stale();
        if let Some(handle) = self.user.live_handle() {
            child.forked = Some(router::fresh(handle, &mut child)?);
        }

        self.statistics.num_forks += 1;
        info!("Forked a solver with {} assertions", self.assertions.len());
        Ok(child)
    }

    /// The propagator cloned into this solver when it was forked.
    pub fn forked_propagator(&self) -> Option<&UserPropagator> {
        self.forked.as_ref()
    }

    pub fn forked_propagator_mut(&mut self) -> Option<&mut UserPropagator> {
        self.forked.as_mut()
    }

    pub fn statistics(&self) -> SolverStatistics {
        self.statistics
    }

    /// Writes the counters of the search, followed by those of the forked propagator if there is
    /// one. Nothing is written unless statistic logging has been configured.
    pub fn log_statistics(&self) {
        self.statistics.log(StatisticLogger::new(["solver"]));
        if let Some(propagator) = &self.forked {
            if let Err(error) =
                propagator.log_statistics(StatisticLogger::new(["forked_propagator"]))
            {
                warn!("The statistics of the forked propagator are unavailable: {error}");
            }
        }
        log_statistic_postfix();
    }
}

impl EngineContext for Solver {
    fn propagate_init(&mut self, handle: Handle) -> Result<(), BridgeError> {
        if self.search.is_active() {
            return Err(BridgeError::IllegalState(
                "a propagator cannot be attached during search",
            ));
        }
        self.attach_propagator(handle)
    }

    fn propagate_enable(&mut self, handle: Handle, capability: Capability) {
        self.enable(handle, capability);
    }

    fn propagate_register(&mut self, handle: Handle, term: Term) {
        self.register_globally(handle, term);
    }

    fn register_on_clause(&mut self, handle: Handle) -> Result<(), BridgeError> {
        if self.search.is_active() {
            return Err(BridgeError::IllegalState(
                "an observer cannot be registered during search",
            ));
        }
        if !self.observers.contains(&handle) {
            self.observers.push(handle);
        }
        Ok(())
    }

    fn unregister_on_clause(&mut self, handle: Handle) {
        self.observers.retain(|&observer| observer != handle);
    }

    fn search_activity(&self) -> SearchActivity {
        self.search.clone()
    }

    fn terms(&mut self) -> &mut TermStore {
        &mut self.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termination::Indefinite;
    use crate::SatisfactionResult;

    #[test]
    fn the_model_satisfies_the_assertions() {
        let mut solver = Solver::default();
        let x = solver.terms().mk_bv_const("x", 4).expect("valid width");
        let five = solver.terms().mk_bv_numeral(5, 4).expect("valid width");
        let equality = solver.terms().mk_eq(x, five).expect("same sort");
        solver.assert(equality).expect("encodable");

        let result = solver.solve(&mut Indefinite).expect("no propagator");

        assert_eq!(SatisfactionResult::Satisfiable, result);
        assert_eq!(Some(5), solver.bv_value(x));
    }

    #[test]
    fn contradicting_assertions_are_unsatisfiable() {
        let mut solver = Solver::default();
        let x = solver.terms().mk_bool_const("x");
        let not_x = solver.terms().mk_not(x).expect("Boolean");
        solver.assert(x).expect("encodable");
        solver.assert(not_x).expect("encodable");

        let result = solver.solve(&mut Indefinite).expect("no propagator");

        assert_eq!(SatisfactionResult::Unsatisfiable, result);
        assert!(solver.is_infeasible());
        assert_eq!(Err(SolverError::InfeasibleState), solver.assert(x));
    }

    #[test]
    fn a_released_propagator_does_not_block_attachment() {
        let mut solver = Solver::default();
        let first = Handle::from_raw(u64::MAX - 1).expect("non-zero");

        // Handles which are not live are dropped on the next attachment.
        solver.propagate_init(first).expect("nothing attached");
        let second = Handle::from_raw(u64::MAX - 2).expect("non-zero");

        assert_eq!(Ok(()), solver.propagate_init(second));
    }

    #[test]
    fn integer_assertions_are_opaque() {
        let mut solver = Solver::default();
        let x = solver.terms().mk_int_const("x");
        let y = solver.terms().mk_int_const("y");
        let equality = solver.terms().mk_eq(x, y).expect("same sort");
        let disequality = solver.terms().mk_not(equality).expect("Boolean");
        solver.assert(disequality).expect("encodable");

        let result = solver.solve(&mut Indefinite).expect("no propagator");

        assert_eq!(SatisfactionResult::Satisfiable, result);
        assert_eq!(Some(false), solver.bool_value(equality));
    }
}
