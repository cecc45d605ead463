use std::cmp::Reverse;
use std::collections::VecDeque;

use log::debug;
use log::trace;
use rand::seq::SliceRandom;
use upbridge_core::handles::is_live;
use upbridge_core::observer::notify_clause;
use upbridge_core::observer::ClauseRecord;
use upbridge_core::observer::ProofHint;
use upbridge_core::BridgeError;

use crate::sat::ClauseRef;
use crate::sat::Literal;
use crate::termination::TerminationCondition;
use crate::SatisfactionResult;
use crate::Solver;
use crate::SolverError;

/// A clause which is waiting to be delivered to the observers and stored.
#[derive(Clone, Debug)]
pub(crate) struct PendingClause {
    literals: Vec<Literal>,
    hint: ProofHint,
}

pub(crate) type PendingClauses = VecDeque<PendingClause>;

impl Solver {
    /// Clauses are only stored between notifications, since storing one may backtrack.
    pub(crate) fn queue_clause(&mut self, literals: Vec<Literal>, hint: ProofHint) {
        self.pending_clauses
            .push_back(PendingClause { literals, hint });
    }

    /// Stores the pending clauses in order; stops at the first one which is violated.
    pub(crate) fn integrate_pending(&mut self) -> Result<Option<ClauseRef>, SolverError> {
        while let Some(pending) = self.pending_clauses.pop_front() {
            if let Some(conflict) = self.add_clause(pending)? {
                return Ok(Some(conflict));
            }
        }
        Ok(None)
    }

    /// Delivers and stores a clause, backtracking when it is violated or unit below the current
    /// decision level; returns the clause when it is violated.
    fn add_clause(&mut self, pending: PendingClause) -> Result<Option<ClauseRef>, SolverError> {
        let PendingClause { mut literals, hint } = pending;
        let index = self.deliver(&literals, hint, &[])?;

        literals.sort();
        literals.dedup();
        if literals.windows(2).any(|pair| pair[0] == !pair[1]) {
            return Ok(None);
        }

        // Watch the literals which are not false, then the false ones assigned last.
        let assignments = &self.assignments;
        literals.sort_by_key(|&literal| match assignments.literal_value(literal) {
            Some(false) => (true, Reverse(assignments.level(literal.variable()))),
            _ => (false, Reverse(0)),
        });

        let Some(&first) = literals.first() else {
            self.backtrack(0)?;
            return Ok(Some(self.clauses.add(literals, index)));
        };

        if literals.len() == 1 {
            if self.assignments.is_true(first) && self.assignments.level(first.variable()) == 0 {
                let _ = self.clauses.add(literals, index);
                return Ok(None);
            }

            self.backtrack(0)?;
            let clause = self.clauses.add(literals, index);
            return match self.assignments.literal_value(first) {
                Some(false) => Ok(Some(clause)),
                Some(true) => Ok(None),
                None => {
                    self.assignments.enqueue(first, Some(clause));
                    Ok(None)
                }
            };
        }

        let second = literals[1];
        if self.assignments.is_false(first) {
            let level = self.assignments.level(first.variable());
            self.backtrack(level)?;
            return Ok(Some(self.clauses.add(literals, index)));
        }

        if self.assignments.is_false(second) && !self.assignments.is_assigned(first.variable()) {
            let level = self.assignments.level(second.variable());
            self.backtrack(level)?;
            let clause = self.clauses.add(literals, index);
            self.assignments.enqueue(first, Some(clause));
            return Ok(None);
        }

        let _ = self.clauses.add(literals, index);
        Ok(None)
    }

    /// Gives the clause its delivery index and sends it to every live observer.
    fn deliver(
        &mut self,
        literals: &[Literal],
        hint: ProofHint,
        dependencies: &[u64],
    ) -> Result<u64, SolverError> {
        let index = self.next_clause_index;
        self.next_clause_index += 1;

        self.observers.retain(|&observer| is_live(observer));
        if self.observers.is_empty() {
            return Ok(index);
        }

        let terms = literals
            .iter()
            .map(|&literal| self.term_of(literal))
            .collect::<Result<Vec<_>, _>>()?;
        let hint = Some(hint).filter(|_| self.options.proof_hints);
        let record = ClauseRecord::new(&terms, hint, dependencies);
        for &observer in &self.observers {
            notify_clause(observer, &record)?;
        }

        Ok(index)
    }

    /// Undoes every decision above `level`, telling the attached propagator how many scopes
    /// were closed.
    pub(crate) fn backtrack(&mut self, level: usize) -> Result<(), BridgeError> {
        let current = self.assignments.decision_level();
        if level >= current {
            return Ok(());
        }

        self.backtrack_silently(level);
        self.notify_pop(current - level)
    }

    pub(crate) fn backtrack_silently(&mut self, level: usize) {
        if level >= self.assignments.decision_level() {
            return;
        }

        trace!("Backtracking to level {level}");
        self.assignments.backtrack(level);
        let trail_len = self.assignments.trail().len();
        self.clauses.synchronise(trail_len);
        self.user.backtrack(level, trail_len);
    }

    fn decide(&mut self, decision: Literal) -> Result<(), BridgeError> {
        self.assignments.new_decision_level();
        self.statistics.num_decisions += 1;
        self.statistics.peak_depth = self
            .statistics
            .peak_depth
            .max(self.assignments.decision_level() as u64);

        self.notify_push()?;
        self.assignments.enqueue(decision, None);
        Ok(())
    }

    /// Propagates until a fixed point of the clauses and the propagator is reached.
    fn propagate(&mut self) -> Result<Option<ClauseRef>, SolverError> {
        loop {
            if let Some(conflict) = self.integrate_pending()? {
                return Ok(Some(conflict));
            }
            if let Some(conflict) = self.clauses.propagate(&mut self.assignments) {
                return Ok(Some(conflict));
            }

            self.notify_propagator()?;
            if self.pending_clauses.is_empty() {
                return Ok(None);
            }
        }
    }

    /// Learns from `conflict`; returns `false` when it refutes the assertions.
    pub(crate) fn resolve_conflict(&mut self, conflict: ClauseRef) -> Result<bool, SolverError> {
        self.statistics.num_conflicts += 1;

        let conflict_level = self
            .clauses
            .get(conflict)
            .literals
            .iter()
            .map(|literal| self.assignments.level(literal.variable()))
            .max()
            .unwrap_or(0);

        if conflict_level == 0 {
            self.backtrack(0)?;
            let dependencies =
                self.analyser
                    .explain_root_conflict(conflict, &self.assignments, &self.clauses);
            let _ = self.deliver(&[], ProofHint::Resolution, &dependencies)?;
            debug!("The assertions are refuted");
            self.infeasible = true;
            return Ok(false);
        }

        self.backtrack(conflict_level)?;
        let learned = self
            .analyser
            .analyse(conflict, &self.assignments, &self.clauses);
        self.backtrack(learned.backtrack_level)?;

        let index = self.deliver(
            &learned.literals,
            ProofHint::Resolution,
            &learned.dependencies,
        )?;
        self.statistics.num_learned_clauses += 1;
        let asserting = learned.literals[0];
        let clause = self.clauses.add(learned.literals, index);
        self.assignments.enqueue(asserting, Some(clause));

        Ok(true)
    }

    fn next_decision(&mut self) -> Result<Option<Literal>, SolverError> {
        let Some(variable) = self
            .decision_order
            .iter()
            .copied()
            .find(|&variable| !self.assignments.is_assigned(variable))
        else {
            return Ok(None);
        };

        let phase = self.options.default_phase.value();
        if let Some(decision) = self.offer_decision(variable, phase)? {
            trace!("The propagator decides on {decision} instead of {variable}");
            self.statistics.num_overridden_decisions += 1;
            return Ok(Some(decision));
        }

        Ok(Some(Literal::new(variable, phase)))
    }

    /// Searches for an assignment satisfying the assertions and the attached propagator.
    ///
    /// Every search starts from the root. When the result is
    /// [`SatisfactionResult::Satisfiable`], the model remains available until the solver is
    /// changed.
    pub fn solve(
        &mut self,
        termination: &mut impl TerminationCondition,
    ) -> Result<SatisfactionResult, SolverError> {
        if self.infeasible {
            return Ok(SatisfactionResult::Unsatisfiable);
        }

        self.backtrack(0)?;
        self.user.drop_stale();
        if self.options.random_decisions {
            self.decision_order.shuffle(&mut self.rng);
        }

        let _search = self.search.enter();
        loop {
            if termination.should_stop() {
                return Ok(SatisfactionResult::Unknown);
            }

            if let Some(conflict) = self.propagate()? {
                termination.conflict_has_been_found();
                if !self.resolve_conflict(conflict)? {
                    return Ok(SatisfactionResult::Unsatisfiable);
                }
                continue;
            }

            if let Some(decision) = self.next_decision()? {
                self.decide(decision)?;
                continue;
            }

            self.notify_final()?;
            if !self.pending_clauses.is_empty() {
                continue;
            }
            if self.instantiate()? {
                continue;
            }

            return Ok(SatisfactionResult::Satisfiable);
        }
    }
}

#[cfg(test)]
mod tests {
    use upbridge_core::observer::ProofHint;

    use crate::sat::Literal;
    use crate::Solver;

    #[test]
    fn a_unit_clause_is_asserted_at_the_root() {
        let mut solver = Solver::default();
        let [x, y] = ["x", "y"].map(|name| {
            let term = solver.terms().mk_bool_const(name);
            solver.literal(term).expect("Boolean")
        });

        solver.decide(y).expect("no propagator");
        solver.queue_clause(vec![x], ProofHint::Asserted);
        let conflict = solver.integrate_pending().expect("no observers");

        assert_eq!(None, conflict);
        assert_eq!(0, solver.assignments.decision_level());
        assert!(solver.assignments.is_true(x));
    }

    #[test]
    fn a_clause_which_is_unit_below_the_current_level_backtracks() {
        let mut solver = Solver::default();
        let [a, b, c, d] = ["a", "b", "c", "d"].map(|name| {
            let term = solver.terms().mk_bool_const(name);
            solver.literal(term).expect("Boolean")
        });

        solver.decide(!a).expect("no propagator");
        solver.decide(!b).expect("no propagator");
        solver.decide(d).expect("no propagator");
        solver.queue_clause(vec![a, c], ProofHint::Asserted);
        let conflict = solver.integrate_pending().expect("no observers");

        assert_eq!(None, conflict);
        assert_eq!(1, solver.assignments.decision_level());
        assert!(solver.assignments.is_true(c));
    }

    #[test]
    fn a_violated_clause_is_reported_at_the_level_of_its_last_literal() {
        let mut solver = Solver::default();
        let [a, b, c] = ["a", "b", "c"].map(|name| {
            let term = solver.terms().mk_bool_const(name);
            solver.literal(term).expect("Boolean")
        });

        solver.decide(!a).expect("no propagator");
        solver.decide(!b).expect("no propagator");
        solver.decide(c).expect("no propagator");
        solver.queue_clause(vec![a, b], ProofHint::Asserted);
        let conflict = solver.integrate_pending().expect("no observers");

        assert!(conflict.is_some());
        assert_eq!(2, solver.assignments.decision_level());
    }

    #[test]
    fn decisions_follow_the_default_phase() {
        let mut solver = Solver::default();
        let x = solver.terms().mk_bool_const("x");
        let literal = solver.literal(x).expect("Boolean");

        let decision = solver.next_decision().expect("no propagator");

        assert_eq!(Some(Literal::new(literal.variable(), false)), decision);
    }
}
