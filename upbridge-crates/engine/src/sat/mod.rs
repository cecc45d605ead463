//! The propositional core of the solver: assignments, clauses with watched literals and
//! conflict analysis.
mod assignments;
mod clause_db;
mod conflict_analysis;
mod literal;

pub(crate) use assignments::Assignments;
pub(crate) use clause_db::ClauseDatabase;
pub(crate) use clause_db::ClauseRef;
pub(crate) use conflict_analysis::ConflictAnalyser;
pub(crate) use literal::Literal;
pub(crate) use literal::Variable;
