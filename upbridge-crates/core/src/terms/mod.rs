//! Opaque term and sort handles as seen by the user-propagator boundary.
//!
//! Term construction is owned by the engine; the boundary only relies on terms having a stable
//! identity, a sort, and structural sharing. [`TermStore`] is the minimal hash-consing store the
//! engines in this workspace use: structurally equal terms share one [`Term`].
mod func_decl;
mod sort;
mod term;
mod term_store;

pub use func_decl::FuncDecl;
pub use func_decl::FuncDeclInfo;
pub use sort::Sort;
pub use sort::SortId;
pub use term::Term;
pub use term::TermId;
pub use term::TermKind;
pub use term_store::TermDisplay;
pub use term_store::TermStore;
