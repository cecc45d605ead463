#![cfg(test)] // workaround for https://github.com/rust-lang/rust-clippy/issues/11024

mod helpers;

use std::sync::Arc;
use std::sync::Mutex;

use helpers::attach_tracker;
use helpers::init_logging;
use upbridge_core::observer::ClauseRecord;
use upbridge_core::observer::OnClause;
use upbridge_core::observer::OwnedClause;
use upbridge_core::observer::ProofHint;
use upbridge_core::propagation::UserPropagator;
use upbridge_core::BridgeError;
use upbridge_engine::termination::ConflictBudget;
use upbridge_engine::termination::Indefinite;
use upbridge_engine::SatisfactionResult;
use upbridge_engine::Solver;
use upbridge_engine::SolverOptions;

/// Asserts (a ∨ b), (a ∨ ¬b), (¬a ∨ c) and (¬a ∨ ¬c).
fn assert_refutable(solver: &mut Solver) {
    let [a, b, c] = ["a", "b", "c"].map(|name| solver.terms().mk_bool_const(name));
    let [not_a, not_b, not_c] =
        [a, b, c].map(|term| solver.terms().mk_not(term).expect("Boolean"));

    for [lhs, rhs] in [[a, b], [a, not_b], [not_a, c], [not_a, not_c]] {
        let clause = solver.terms().mk_or(&[lhs, rhs]).expect("Boolean");
        solver.assert(clause).expect("encodable");
    }
}

fn record_clauses(solver: &mut Solver) -> (OnClause, Arc<Mutex<Vec<OwnedClause>>>) {
    init_logging();
    let clauses = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&clauses);
    let observer = OnClause::observe(solver, move |clause: &ClauseRecord<'_>| {
        sink.lock().expect("not poisoned").push(clause.to_owned_clause());
    })
    .expect("not searching");
    (observer, clauses)
}

#[test]
fn every_clause_is_delivered_with_its_derivation() {
    let mut solver = Solver::default();
    let (observer, clauses) = record_clauses(&mut solver);
    assert_refutable(&mut solver);

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Unsatisfiable, result);
    let clauses = clauses.lock().expect("not poisoned");
    assert_eq!(
        clauses.len() as u64,
        observer.clauses_delivered().expect("live")
    );

    let num_asserted = clauses
        .iter()
        .filter(|clause| clause.hint == Some(ProofHint::Asserted))
        .count();
    assert_eq!(4, num_asserted);
    assert!(clauses
        .iter()
        .any(|clause| clause.hint == Some(ProofHint::Definition)));

    for (index, clause) in clauses.iter().enumerate() {
        assert!(clause
            .dependencies
            .iter()
            .all(|&dependency| dependency < index as u64));
    }

    let refutation = clauses.last().expect("at least one clause");
    assert!(refutation.literals.is_empty());
    assert_eq!(Some(ProofHint::Resolution), refutation.hint);
    assert!(!refutation.dependencies.is_empty());
}

#[test]
fn hints_can_be_left_out() {
    let mut solver = Solver::with_options(SolverOptions {
        proof_hints: false,
        ..Default::default()
    });
    let (_observer, clauses) = record_clauses(&mut solver);
    assert_refutable(&mut solver);

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Unsatisfiable, result);
    assert!(clauses
        .lock()
        .expect("not poisoned")
        .iter()
        .all(|clause| clause.hint.is_none()));
}

#[test]
fn closed_observers_receive_nothing() {
    let mut solver = Solver::default();
    let (mut observer, clauses) = record_clauses(&mut solver);
    observer.close(&mut solver).expect("not searching");

    assert_refutable(&mut solver);
    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Unsatisfiable, result);
    assert!(clauses.lock().expect("not poisoned").is_empty());
    assert_eq!(
        Err(BridgeError::InvalidHandle(observer.handle())),
        observer.clauses_delivered()
    );
}

#[test]
fn propagators_cannot_be_closed_during_search() {
    let mut solver = Solver::default();
    assert_refutable(&mut solver);

    let propagator: Arc<Mutex<Option<UserPropagator>>> =
        Arc::new(Mutex::new(Some(attach_tracker(&mut solver, &[]))));
    let attempts = Arc::new(Mutex::new(Vec::new()));

    let (target, outcomes) = (Arc::clone(&propagator), Arc::clone(&attempts));
    let _observer = OnClause::observe(&mut solver, move |_: &ClauseRecord<'_>| {
        let mut target = target.lock().expect("not poisoned");
        if let Some(propagator) = target.as_mut() {
            outcomes
                .lock()
                .expect("not poisoned")
                .push(propagator.close());
        }
    })
    .expect("not searching");

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Unsatisfiable, result);
    let attempts = attempts.lock().expect("not poisoned");
    assert!(!attempts.is_empty());
    assert!(attempts
        .iter()
        .all(|attempt| matches!(attempt, Err(BridgeError::IllegalState(_)))));

    let mut propagator = propagator.lock().expect("not poisoned");
    assert_eq!(
        Ok(()),
        propagator.as_mut().expect("still owned").close()
    );
}

#[test]
fn the_search_can_be_interrupted() {
    let mut solver = Solver::default();
    assert_refutable(&mut solver);

    let result = solver
        .solve(&mut ConflictBudget::new(1))
        .expect("no errors");

    assert_eq!(SatisfactionResult::Unknown, result);
    assert!(!solver.is_infeasible());
}
