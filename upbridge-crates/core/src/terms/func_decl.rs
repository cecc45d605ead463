use std::sync::Arc;

use super::Sort;
use crate::containers::StorageKey;

/// A declared function symbol.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FuncDecl(u32);

impl StorageKey for FuncDecl {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        FuncDecl(index as u32)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncDeclInfo {
    pub name: Arc<str>,
    pub domain: Vec<Sort>,
    pub range: Sort,
    /// Applications of propagated functions are announced to the user propagator when the engine
    /// internalises them.
    pub propagated: bool,
}
