use upbridge_core::containers::KeyedVec;
use upbridge_core::containers::StorageKey;
use upbridge_core::upbridge_assert_moderate;

use super::Assignments;
use super::Literal;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ClauseRef(u32);

impl StorageKey for ClauseRef {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        ClauseRef(index as u32)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Clause {
    /// The first two literals are watched.
    pub(crate) literals: Vec<Literal>,
    /// The position of the clause in the order in which clauses were delivered to observers.
    pub(crate) index: u64,
}

/// The clauses of the solver with two watched literals each.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClauseDatabase {
    clauses: KeyedVec<ClauseRef, Clause>,
    /// For every literal, the clauses which watch it.
    watches: KeyedVec<Literal, Vec<ClauseRef>>,
    /// The position on the trail up to which assignments have been propagated.
    propagation_head: usize,
}

impl ClauseDatabase {
    pub(crate) fn grow_to(&mut self, num_variables: usize) {
        self.watches.grow_to(2 * num_variables, Vec::new());
    }

    pub(crate) fn get(&self, clause: ClauseRef) -> &Clause {
        &self.clauses[clause]
    }

    /// Stores a clause; the caller orders the literals such that the first two are the best
    /// literals to watch.
    pub(crate) fn add(&mut self, literals: Vec<Literal>, index: u64) -> ClauseRef {
        let clause = self.clauses.next_key();
        if literals.len() >= 2 {
            self.watches[literals[0]].push(clause);
            self.watches[literals[1]].push(clause);
        }
        let _ = self.clauses.push(Clause { literals, index });
        clause
    }

    /// Propagation may resume from `trail_len` after backtracking.
    pub(crate) fn synchronise(&mut self, trail_len: usize) {
        self.propagation_head = self.propagation_head.min(trail_len);
    }

    /// Unit propagation up to a fixed point; returns the violated clause on a conflict.
    pub(crate) fn propagate(&mut self, assignments: &mut Assignments) -> Option<ClauseRef> {
        while self.propagation_head < assignments.trail().len() {
            let false_literal = !assignments.trail()[self.propagation_head];
            self.propagation_head += 1;

            let watchers = std::mem::take(&mut self.watches[false_literal]);
            let mut kept = Vec::with_capacity(watchers.len());
            let mut conflict = None;

            for clause in watchers {
                if conflict.is_some() {
                    kept.push(clause);
                    continue;
                }

                let literals = &mut self.clauses[clause].literals;
                if literals[0] == false_literal {
                    literals.swap(0, 1);
                }
                upbridge_assert_moderate!(literals[1] == false_literal);

                if assignments.is_true(literals[0]) {
                    kept.push(clause);
                    continue;
                }

                if let Some(replacement) =
                    (2..literals.len()).find(|&position| !assignments.is_false(literals[position]))
                {
                    literals.swap(1, replacement);
                    self.watches[literals[1]].push(clause);
                    continue;
                }

                kept.push(clause);
                if assignments.is_false(literals[0]) {
                    conflict = Some(clause);
                } else {
                    assignments.enqueue(literals[0], Some(clause));
                }
            }

            self.watches[false_literal] = kept;
            if conflict.is_some() {
                return conflict;
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::Variable;

    fn setup(num_variables: usize) -> (Assignments, ClauseDatabase, Vec<Variable>) {
        let mut assignments = Assignments::default();
        let variables = (0..num_variables)
            .map(|_| assignments.new_variable())
            .collect::<Vec<_>>();
        let mut clauses = ClauseDatabase::default();
        clauses.grow_to(num_variables);
        (assignments, clauses, variables)
    }

    #[test]
    fn the_last_unassigned_literal_is_propagated() {
        let (mut assignments, mut clauses, variables) = setup(3);
        let [a, b, c] = [0, 1, 2].map(|index| Literal::new(variables[index], true));
        let clause = clauses.add(vec![a, b, c], 0);

        assignments.new_decision_level();
        assignments.enqueue(!a, None);
        assignments.enqueue(!b, None);

        assert_eq!(None, clauses.propagate(&mut assignments));
        assert!(assignments.is_true(c));
        assert_eq!(Some(clause), assignments.reason(c.variable()));
    }

    #[test]
    fn a_falsified_clause_is_reported() {
        let (mut assignments, mut clauses, variables) = setup(2);
        let [a, b] = [0, 1].map(|index| Literal::new(variables[index], true));
        let _ = clauses.add(vec![a, b], 0);
        let clause = clauses.add(vec![a, !b], 1);

        assignments.new_decision_level();
        assignments.enqueue(!a, None);

        assert_eq!(Some(clause), clauses.propagate(&mut assignments));
    }
}
