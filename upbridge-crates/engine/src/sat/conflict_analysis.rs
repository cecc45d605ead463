use itertools::Itertools;
use upbridge_core::containers::HashSet;
use upbridge_core::upbridge_assert_moderate;

use super::Assignments;
use super::ClauseDatabase;
use super::ClauseRef;
use super::Literal;
use super::Variable;

/// The clause derived from a conflict.
#[derive(Clone, Debug)]
pub(crate) struct LearnedClause {
    /// The asserting literal comes first, followed by the other literals by non-increasing
    /// decision level.
    pub(crate) literals: Vec<Literal>,
    pub(crate) backtrack_level: usize,
    /// The delivery indices of the clauses which were resolved to derive this clause.
    pub(crate) dependencies: Vec<u64>,
}

/// Derives first unique implication point clauses by resolution.
#[derive(Clone, Debug, Default)]
pub(crate) struct ConflictAnalyser {
    seen: HashSet<Variable>,
}

impl ConflictAnalyser {
    /// Requires `conflict` to contain at least one literal assigned at the current decision level,
    /// which is above the root.
    pub(crate) fn analyse(
        &mut self,
        conflict: ClauseRef,
        assignments: &Assignments,
        clauses: &ClauseDatabase,
    ) -> LearnedClause {
        self.seen.clear();
        let current_level = assignments.decision_level();
        upbridge_assert_moderate!(current_level > 0);

        let mut dependencies = Vec::new();
        let mut rest = Vec::new();
        let mut num_at_current_level = 0_usize;
        let mut trail_position = assignments.trail().len();
        let mut clause = conflict;

        let asserting_literal = loop {
            let record = clauses.get(clause);
            dependencies.push(record.index);

            for &literal in &record.literals {
                let variable = literal.variable();
                if !self.seen.insert(variable) {
                    continue;
                }

                let level = assignments.level(variable);
                if level == 0 {
                    // Root assignments are left out of the clause, so their reasons are part of
                    // the derivation.
                    if let Some(reason) = assignments.reason(variable) {
                        dependencies.push(clauses.get(reason).index);
                    }
                } else if level == current_level {
                    num_at_current_level += 1;
                } else {
                    rest.push(literal);
                }
            }

            // The most recent assignment at the current level which takes part in the conflict.
            let pivot = loop {
                trail_position -= 1;
                let literal = assignments.trail()[trail_position];
                let variable = literal.variable();
                if self.seen.contains(&variable) && assignments.level(variable) == current_level {
                    break literal;
                }
            };

            num_at_current_level -= 1;
            if num_at_current_level == 0 {
                break !pivot;
            }

            let Some(reason) = assignments.reason(pivot.variable()) else {
                // Only the decision of a level has no reason, and it is the last literal of the
                // level to be visited.
                break !pivot;
            };
            clause = reason;
        };

        rest.sort_by_key(|literal: &Literal| {
            std::cmp::Reverse(assignments.level(literal.variable()))
        });
        let backtrack_level = rest
            .first()
            .map(|literal| assignments.level(literal.variable()))
            .unwrap_or(0);

        let mut literals = Vec::with_capacity(rest.len() + 1);
        literals.push(asserting_literal);
        literals.extend(rest);

        LearnedClause {
            literals,
            backtrack_level,
            dependencies: dependencies.into_iter().unique().collect(),
        }
    }

    /// The delivery indices of the clauses which refute the root level, given a clause which is
    /// violated at the root.
    pub(crate) fn explain_root_conflict(
        &self,
        conflict: ClauseRef,
        assignments: &Assignments,
        clauses: &ClauseDatabase,
    ) -> Vec<u64> {
        let record = clauses.get(conflict);
        std::iter::once(record.index)
            .chain(
                record
                    .literals
                    .iter()
                    .filter_map(|literal| assignments.reason(literal.variable()))
                    .map(|reason| clauses.get(reason).index),
            )
            .unique()
            .collect()
    }
}
