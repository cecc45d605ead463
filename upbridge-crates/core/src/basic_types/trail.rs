use std::iter::Rev;
use std::ops::Deref;
use std::vec::Drain;

use crate::upbridge_assert_simple;

/// An append-only log of entries partitioned into backtracking scopes.
///
/// Entries pushed after the `k`-th call to [`Trail::new_scope`] belong to scope `k`; entries
/// pushed before any scope was opened belong to the root scope `0` and are never popped.
#[derive(Clone, Debug)]
pub struct Trail<T> {
    current_scope: usize,
    /// At index i is the position where scope i ends (exclusive) on the trail
    scope_delimiters: Vec<usize>,
    entries: Vec<T>,
}

// Implemented by hand so that `T` is not required to implement `Default`.
impl<T> Default for Trail<T> {
    fn default() -> Self {
        Trail {
            current_scope: 0,
            scope_delimiters: Vec::new(),
            entries: Vec::new(),
        }
    }
}

impl<T> Trail<T> {
    pub fn new_scope(&mut self) {
        self.current_scope += 1;
        self.scope_delimiters.push(self.entries.len());
    }

    /// The number of scopes which are currently open.
    pub fn scope(&self) -> usize {
        self.current_scope
    }

    pub fn entries_in_scope(&self, scope: usize) -> &[T] {
        upbridge_assert_simple!(scope <= self.current_scope);

        let start = if scope == 0 {
            0
        } else {
            self.scope_delimiters[scope - 1]
        };

        let end = if scope == self.current_scope {
            self.entries.len()
        } else {
            self.scope_delimiters[scope]
        };

        &self.entries[start..end]
    }

    /// Closes the `num_scopes` innermost scopes and returns their entries, most recent first.
    pub fn pop_scopes(&mut self, num_scopes: usize) -> Rev<Drain<'_, T>> {
        upbridge_assert_simple!(
            num_scopes <= self.current_scope,
            "cannot pop {num_scopes} scopes when only {} are open",
            self.current_scope
        );
        self.backtrack_to(self.current_scope - num_scopes)
    }

    /// Closes every scope above `scope` and returns the removed entries, most recent first.
    pub fn backtrack_to(&mut self, scope: usize) -> Rev<Drain<'_, T>> {
        upbridge_assert_simple!(scope <= self.current_scope);

        let new_len = if scope == self.current_scope {
            self.entries.len()
        } else {
            self.scope_delimiters[scope]
        };

        self.current_scope = scope;
        self.scope_delimiters.truncate(scope);
        self.entries.drain(new_len..).rev()
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry)
    }
}

impl<T> Deref for Trail<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_entries_survive_popping_every_scope() {
        let mut trail = Trail::default();
        trail.push(1);

        trail.new_scope();
        trail.push(2);
        let popped = trail.pop_scopes(1).collect::<Vec<_>>();

        assert_eq!(vec![2], popped);
        assert_eq!(&[1], trail.deref());
        assert_eq!(0, trail.scope());
    }

    #[test]
    fn popping_several_scopes_at_once_returns_entries_most_recent_first() {
        let mut trail = Trail::default();
        trail.push(1);

        trail.new_scope();
        trail.push(2);
        trail.new_scope();
        trail.push(3);
        trail.new_scope();
        trail.push(4);

        let popped = trail.pop_scopes(2).collect::<Vec<_>>();
        assert_eq!(vec![4, 3], popped);
        assert_eq!(&[1, 2], trail.deref());
        assert_eq!(1, trail.scope());
    }

    #[test]
    fn backtracking_to_the_current_scope_removes_nothing() {
        let mut trail = Trail::default();
        trail.new_scope();
        trail.push(7);

        assert_eq!(0, trail.backtrack_to(1).count());
        assert_eq!(&[7], trail.deref());
    }

    #[test]
    fn entries_are_partitioned_by_scope() {
        let mut trail = Trail::default();
        trail.push(1);
        trail.push(2);

        trail.new_scope();
        trail.new_scope();
        trail.push(4);
        trail.push(5);

        assert_eq!(&[1, 2], trail.entries_in_scope(0));
        assert!(trail.entries_in_scope(1).is_empty());
        assert_eq!(&[4, 5], trail.entries_in_scope(2));
    }

    #[test]
    #[should_panic]
    fn popping_more_scopes_than_are_open_is_rejected() {
        let mut trail: Trail<u32> = Trail::default();
        trail.new_scope();
        let _ = trail.pop_scopes(2);
    }
}
