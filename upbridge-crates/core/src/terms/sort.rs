use std::fmt::Display;
use std::fmt::Formatter;

use crate::containers::StorageKey;

/// Identifies an uninterpreted sort within a [`crate::terms::TermStore`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortId(u32);

impl StorageKey for SortId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        SortId(index as u32)
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Sort {
    Bool,
    /// Fixed-width integers, with a width between 1 and 64 bits.
    BitVec(u32),
    Int,
    Real,
    Uninterpreted(SortId),
}

impl Sort {
    /// Whether terms of this sort may be registered with a user propagator.
    pub fn is_registrable(self) -> bool {
        matches!(self, Sort::Bool | Sort::BitVec(_))
    }

    /// The number of Boolean decisions an engine makes to fix a term of this sort, if it can.
    pub fn num_bits(self) -> Option<u32> {
        match self {
            Sort::Bool => Some(1),
            Sort::BitVec(width) => Some(width),
            Sort::Int | Sort::Real | Sort::Uninterpreted(_) => None,
        }
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Sort::Bool => f.write_str("Bool"),
            Sort::BitVec(width) => write!(f, "(_ BitVec {width})"),
            Sort::Int => f.write_str("Int"),
            Sort::Real => f.write_str("Real"),
            Sort::Uninterpreted(id) => write!(f, "U{}", id.0),
        }
    }
}
