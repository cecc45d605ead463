use crate::terms::Term;

/// The rule by which an engine derived a clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProofHint {
    /// Part of the input.
    Asserted,
    /// Introduced to define an auxiliary variable.
    Definition,
    /// Derived by resolving the clauses it depends on.
    Resolution,
    /// Proposed by a user propagator as a consequence.
    PropagatorLemma,
    /// An instance of a universally quantified assertion.
    Instance,
}

/// A clause as delivered to a clause observer.
///
/// Everything the record refers to is only valid for the duration of the call it was passed to;
/// use [`ClauseRecord::to_owned_clause`] to keep it.
#[derive(Clone, Copy, Debug)]
pub struct ClauseRecord<'a> {
    literals: &'a [Term],
    hint: Option<ProofHint>,
    dependencies: &'a [u64],
}

impl<'a> ClauseRecord<'a> {
    pub fn new(literals: &'a [Term], hint: Option<ProofHint>, dependencies: &'a [u64]) -> Self {
        ClauseRecord {
            literals,
            hint,
            dependencies,
        }
    }

    pub fn literals(&self) -> &'a [Term] {
        self.literals
    }

    /// `None` when the engine does not produce hints.
    pub fn hint(&self) -> Option<ProofHint> {
        self.hint
    }

    /// The indices of the earlier clauses this clause was derived from, in delivery order.
    pub fn dependencies(&self) -> &'a [u64] {
        self.dependencies
    }

    pub fn to_owned_clause(&self) -> OwnedClause {
        OwnedClause {
            literals: self.literals.to_vec(),
            hint: self.hint,
            dependencies: self.dependencies.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedClause {
    pub literals: Vec<Term>,
    pub hint: Option<ProofHint>,
    pub dependencies: Vec<u64>,
}
