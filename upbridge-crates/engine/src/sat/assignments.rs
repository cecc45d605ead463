use upbridge_core::containers::KeyedVec;
use upbridge_core::upbridge_assert_moderate;
use upbridge_core::upbridge_assert_simple;
use upbridge_core::Trail;

use super::ClauseRef;
use super::Literal;
use super::Variable;

/// The partial assignment of the propositional variables, with the decision level, reason and
/// trail position of every assigned variable.
#[derive(Clone, Debug, Default)]
pub(crate) struct Assignments {
    values: KeyedVec<Variable, Option<bool>>,
    levels: KeyedVec<Variable, usize>,
    reasons: KeyedVec<Variable, Option<ClauseRef>>,
    positions: KeyedVec<Variable, usize>,
    /// One scope per decision level.
    trail: Trail<Literal>,
}

impl Assignments {
    pub(crate) fn new_variable(&mut self) -> Variable {
        let _ = self.levels.push(0);
        let _ = self.reasons.push(None);
        let _ = self.positions.push(0);
        self.values.push(None)
    }

    pub(crate) fn num_variables(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn value(&self, variable: Variable) -> Option<bool> {
        self.values[variable]
    }

    pub(crate) fn literal_value(&self, literal: Literal) -> Option<bool> {
        self.values[literal.variable()].map(|value| value == literal.is_positive())
    }

    pub(crate) fn is_true(&self, literal: Literal) -> bool {
        self.literal_value(literal) == Some(true)
    }

    pub(crate) fn is_false(&self, literal: Literal) -> bool {
        self.literal_value(literal) == Some(false)
    }

    pub(crate) fn is_assigned(&self, variable: Variable) -> bool {
        self.values[variable].is_some()
    }

    pub(crate) fn level(&self, variable: Variable) -> usize {
        upbridge_assert_moderate!(self.is_assigned(variable));
        self.levels[variable]
    }

    pub(crate) fn reason(&self, variable: Variable) -> Option<ClauseRef> {
        self.reasons[variable]
    }

    /// The position of the assignment of `variable` on the trail.
    pub(crate) fn position(&self, variable: Variable) -> usize {
        self.positions[variable]
    }

    pub(crate) fn decision_level(&self) -> usize {
        self.trail.scope()
    }

    pub(crate) fn trail(&self) -> &[Literal] {
        &self.trail
    }

    pub(crate) fn new_decision_level(&mut self) {
        self.trail.new_scope();
    }

    /// Makes `literal` true at the current decision level.
    pub(crate) fn enqueue(&mut self, literal: Literal, reason: Option<ClauseRef>) {
        let variable = literal.variable();
        upbridge_assert_simple!(
            !self.is_assigned(variable),
            "{variable} is assigned twice"
        );

        self.values[variable] = Some(literal.is_positive());
        self.levels[variable] = self.trail.scope();
        self.reasons[variable] = reason;
        self.positions[variable] = self.trail.len();
        self.trail.push(literal);
    }

    /// Undoes every assignment made above decision level `level`.
    pub(crate) fn backtrack(&mut self, level: usize) {
        for literal in self.trail.backtrack_to(level) {
            let variable = literal.variable();
            self.values[variable] = None;
            self.reasons[variable] = None;
        }
    }
}
