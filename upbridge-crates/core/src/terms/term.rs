use std::sync::Arc;

use super::FuncDecl;
use super::Sort;
use crate::containers::StorageKey;

/// Identifies a node within a [`crate::terms::TermStore`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TermId(u32);

impl StorageKey for TermId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        TermId(index as u32)
    }
}

/// An opaque handle to a term.
///
/// Two terms are equal exactly when they have the same identity; since the store shares
/// structurally equal terms, this coincides with structural equality for terms of one store.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Term {
    id: TermId,
    sort: Sort,
}

impl Term {
    pub(crate) fn new(id: TermId, sort: Sort) -> Self {
        Term { id, sort }
    }

    pub fn id(self) -> TermId {
        self.id
    }

    pub fn sort(self) -> Sort {
        self.sort
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum TermKind {
    True,
    False,
    BitVecNumeral { value: u64, width: u32 },
    IntNumeral(i64),
    Constant { name: Arc<str> },
    Not(Term),
    And(Vec<Term>),
    Or(Vec<Term>),
    Implies(Term, Term),
    Eq(Term, Term),
    /// Bit `index` of a bit-vector term, as a Boolean.
    Bit { of: Term, index: u32 },
    App { decl: FuncDecl, args: Vec<Term> },
    Forall { bound: Vec<Term>, body: Term },
}
