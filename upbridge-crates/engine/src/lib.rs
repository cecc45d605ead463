//! # Upbridge engine
//! A compact conflict-driven search engine over Boolean and bit-vector assertions which drives
//! the user-propagator boundary of [`upbridge_core`].
//!
//! The [`Solver`] is an engine context. A
//! [`UserPropagator`](upbridge_core::propagation::UserPropagator) attached to it is told about
//! scope changes, assignments of the terms it registered, equalities, final checks, decisions and
//! quantifier bindings, and may answer with consequences and decision overrides.
//!
//! Every clause the solver adds, including the clauses it learns from conflicts, is delivered to
//! the attached [`OnClause`](upbridge_core::observer::OnClause) observers.
//!
//! # Example
//! ```rust
//! # use upbridge_core::propagation::FixedHandler;
//! # use upbridge_core::propagation::FreshContext;
//! # use upbridge_core::propagation::PropagatorContext;
//! # use upbridge_core::propagation::UserPropagator;
//! # use upbridge_core::propagation::UserPropagatorCallbacks;
//! # use upbridge_core::terms::Term;
//! # use upbridge_engine::termination::Indefinite;
//! # use upbridge_engine::SatisfactionResult;
//! # use upbridge_engine::Solver;
//! /// Forbids both registered terms from being true.
//! #[derive(Default)]
//! struct NotBoth {
//!     true_terms: Vec<Term>,
//!     scope_starts: Vec<usize>,
//! }
//!
//! impl UserPropagatorCallbacks for NotBoth {
//!     fn push(&mut self) {
//!         self.scope_starts.push(self.true_terms.len());
//!     }
//!
//!     fn pop(&mut self, num_scopes: u32) {
//!         let remaining = self.scope_starts.len() - num_scopes as usize;
//!         self.true_terms.truncate(self.scope_starts[remaining]);
//!         self.scope_starts.truncate(remaining);
//!     }
//!
//!     fn fresh(&mut self, _: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks> {
//!         Box::new(NotBoth::default())
//!     }
//!
//!     fn as_fixed(&mut self) -> Option<&mut dyn FixedHandler> {
//!         Some(self)
//!     }
//! }
//!
//! impl FixedHandler for NotBoth {
//!     fn fixed(&mut self, context: &mut PropagatorContext<'_>, term: Term, value: Term) {
//!         if context.terms().bool_value(value) != Some(true) {
//!             return;
//!         }
//!         self.true_terms.push(term);
//!         if self.true_terms.len() == 2 {
//!             let conflict = context.terms().mk_false();
//!             let _ = context.consequence(&self.true_terms, conflict);
//!         }
//!     }
//! }
//!
//! let mut solver = Solver::default();
//! let x = solver.terms().mk_bool_const("x");
//! let y = solver.terms().mk_bool_const("y");
//! let either = solver.terms().mk_or(&[x, y]).unwrap();
//! solver.assert(either).unwrap();
//!
//! let propagator = UserPropagator::attach(&mut solver, NotBoth::default()).unwrap();
//! propagator.register_fixed(&mut solver).unwrap();
//! propagator.add(&mut solver, x).unwrap();
//! propagator.add(&mut solver, y).unwrap();
//!
//! assert_eq!(SatisfactionResult::Satisfiable, solver.solve(&mut Indefinite).unwrap());
//! assert_ne!(solver.bool_value(x), solver.bool_value(y));
//! ```
mod encoding;
mod error;
mod options;
mod quantifiers;
mod results;
mod sat;
mod search;
mod solver;
mod statistics;
pub mod termination;
mod user_propagator;

pub use error::SolverError;
pub use options::DefaultPhase;
pub use options::SolverOptions;
pub use results::SatisfactionResult;
pub use solver::Solver;
pub use statistics::SolverStatistics;
pub use upbridge_core;
