#![cfg(test)] // workaround for https://github.com/rust-lang/rust-clippy/issues/11024

mod helpers;

use helpers::attach_tracker;
use helpers::events;
use helpers::fixed_events;
use helpers::Event;
use helpers::Tracker;
use upbridge_core::propagation::declare_function;
use upbridge_core::propagation::DecideHandler;
use upbridge_core::propagation::FinalHandler;
use upbridge_core::propagation::FixedHandler;
use upbridge_core::propagation::FreshContext;
use upbridge_core::propagation::Phase;
use upbridge_core::propagation::PropagatorContext;
use upbridge_core::propagation::UserPropagator;
use upbridge_core::propagation::UserPropagatorCallbacks;
use upbridge_core::terms::Sort;
use upbridge_core::terms::Term;
use upbridge_core::BridgeError;
use upbridge_engine::termination::Indefinite;
use upbridge_engine::DefaultPhase;
use upbridge_engine::SatisfactionResult;
use upbridge_engine::Solver;
use upbridge_engine::SolverOptions;

/// Allows at most one of its registered Boolean terms to be true.
#[derive(Debug, Default)]
struct AtMostOne {
    true_terms: Vec<Term>,
    scope_starts: Vec<usize>,
    accepted: usize,
}

impl UserPropagatorCallbacks for AtMostOne {
    fn push(&mut self) {
        self.scope_starts.push(self.true_terms.len());
    }

    fn pop(&mut self, num_scopes: u32) {
        let remaining = self.scope_starts.len() - num_scopes as usize;
        self.true_terms.truncate(self.scope_starts[remaining]);
        self.scope_starts.truncate(remaining);
    }

    fn fresh(&mut self, _context: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks> {
        Box::new(AtMostOne::default())
    }

    fn as_fixed(&mut self) -> Option<&mut dyn FixedHandler> {
        Some(self)
    }
}

impl FixedHandler for AtMostOne {
    fn fixed(&mut self, context: &mut PropagatorContext<'_>, term: Term, value: Term) {
        if context.terms().bool_value(value) != Some(true) {
            return;
        }
        self.true_terms.push(term);
        if self.true_terms.len() > 1 {
            let conflict = context.terms().mk_false();
            if context
                .consequence(&self.true_terms, conflict)
                .expect("inside a callback")
            {
                self.accepted += 1;
            }
        }
    }
}

#[test]
fn fixed_terms_are_reported_once() {
    let mut solver = Solver::default();
    let x = solver.terms().mk_bool_const("x");
    solver.assert(x).expect("encodable");

    let propagator = attach_tracker(&mut solver, &[x]);
    propagator.register_fixed(&mut solver).expect("live");

    let first = solver.solve(&mut Indefinite).expect("no errors");
    let second = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Satisfiable, first);
    assert_eq!(SatisfactionResult::Satisfiable, second);
    let true_term = solver.terms().mk_true();
    assert_eq!(vec![(x, true_term)], fixed_events(&propagator));
}

#[test]
fn scopes_of_the_solver_are_mirrored() {
    let mut solver = Solver::default();
    let x = solver.terms().mk_bool_const("x");
    let y = solver.terms().mk_bool_const("y");

    let propagator = attach_tracker(&mut solver, &[x, y]);
    propagator.register_fixed(&mut solver).expect("live");

    let result = solver.solve(&mut Indefinite).expect("no errors");
    assert_eq!(SatisfactionResult::Satisfiable, result);
    assert_eq!(2, propagator.scope_depth().expect("live"));

    solver.reset().expect("not searching");

    let false_term = solver.terms().mk_false();
    assert_eq!(
        vec![
            Event::Push,
            Event::Fixed(x, false_term),
            Event::Push,
            Event::Fixed(y, false_term),
            Event::Pop(2),
        ],
        events(&propagator)
    );
    assert_eq!(0, propagator.scope_depth().expect("live"));
}

#[test]
fn consequences_become_clauses() {
    let mut solver = Solver::with_options(SolverOptions {
        default_phase: DefaultPhase::True,
        ..Default::default()
    });
    let terms = ["x", "y", "z"].map(|name| solver.terms().mk_bool_const(name));

    let propagator =
        UserPropagator::attach(&mut solver, AtMostOne::default()).expect("nothing attached");
    propagator.register_fixed(&mut solver).expect("live");
    for term in terms {
        propagator.add(&mut solver, term).expect("registrable");
    }

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Satisfiable, result);
    let num_true = terms
        .iter()
        .filter(|&&term| solver.bool_value(term) == Some(true))
        .count();
    assert_eq!(1, num_true);

    let accepted = propagator
        .with_handler(|handler: &mut AtMostOne| handler.accepted)
        .expect("an at most one");
    let statistics = propagator.statistics().expect("live");
    assert_eq!(2, accepted);
    assert_eq!(2, statistics.consequences_accepted);
    assert_eq!(2, solver.statistics().num_propagator_lemmas);
}

#[test]
fn facts_of_a_popped_scope_are_not_seen_by_a_later_attachment() {
    let mut solver = Solver::with_options(SolverOptions {
        default_phase: DefaultPhase::True,
        ..Default::default()
    });
    let x = solver.terms().mk_bool_const("x");

    let mut first = attach_tracker(&mut solver, &[x]);
    first.register_fixed(&mut solver).expect("live");
    let result = solver.solve(&mut Indefinite).expect("no errors");
    assert_eq!(SatisfactionResult::Satisfiable, result);

    solver.reset().expect("not searching");

    let true_term = solver.terms().mk_true();
    assert_eq!(
        vec![Event::Push, Event::Fixed(x, true_term), Event::Pop(1)],
        events(&first)
    );

    first.close().expect("not searching");
    assert_eq!(None, solver.bool_value(x));

    let second = attach_tracker(&mut solver, &[x]);
    second.register_fixed(&mut solver).expect("live");
    assert!(events(&second).is_empty());
}

/// Decides the most significant bit of the first term it is asked about to one.
#[derive(Debug, Default)]
struct HighBitFirst {
    overrides: Vec<bool>,
}

impl UserPropagatorCallbacks for HighBitFirst {
    fn push(&mut self) {}

    fn pop(&mut self, _num_scopes: u32) {}

    fn fresh(&mut self, _context: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks> {
        Box::new(HighBitFirst::default())
    }

    fn as_decide(&mut self) -> Option<&mut dyn DecideHandler> {
        Some(self)
    }
}

impl DecideHandler for HighBitFirst {
    fn decide(&mut self, context: &mut PropagatorContext<'_>, term: Term, _: u32, _: bool) {
        let Sort::BitVec(width) = term.sort() else {
            return;
        };
        let accepted = context
            .next_split(term, width - 1, Phase::True)
            .expect("inside a decision");
        self.overrides.push(accepted);
    }
}

#[test]
fn decisions_can_be_overridden() {
    let mut solver = Solver::default();
    let x = solver.terms().mk_bv_const("x", 4).expect("valid width");

    let propagator =
        UserPropagator::attach(&mut solver, HighBitFirst::default()).expect("nothing attached");
    propagator.register_decide(&mut solver).expect("live");
    propagator.add(&mut solver, x).expect("registrable");

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Satisfiable, result);
    assert_eq!(Some(8), solver.bv_value(x));
    assert_eq!(1, solver.statistics().num_overridden_decisions);
    let overrides = propagator
        .with_handler(|handler: &mut HighBitFirst| handler.overrides.clone())
        .expect("a high bit first");
    assert_eq!(vec![true, false, false, false], overrides);
}

#[test]
fn applications_are_created_once() {
    let mut solver = Solver::default();
    let propagator = attach_tracker(&mut solver, &[]);
    propagator.register_created(&mut solver).expect("live");

    let f = declare_function(&mut solver, "f", &[Sort::BitVec(4)], Sort::Bool)
        .expect("valid signature");
    let zero = solver.terms().mk_bv_numeral(0, 4).expect("valid width");
    let first = solver.terms().mk_app(f, &[zero]).expect("well sorted");
    let second = solver.terms().mk_app(f, &[zero]).expect("well sorted");
    let y = solver.terms().mk_bool_const("y");
    let either = solver.terms().mk_or(&[second, y]).expect("Boolean");
    solver.assert(first).expect("encodable");
    solver.assert(either).expect("encodable");

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Satisfiable, result);
    assert_eq!(first, second);
    let num_created = propagator
        .with_handler(|tracker: &mut Tracker| tracker.count(&Event::Created(first)))
        .expect("a tracker");
    assert_eq!(1, num_created);
}

#[test]
fn applications_over_integers_are_created_once() {
    let mut solver = Solver::default();
    let propagator = attach_tracker(&mut solver, &[]);
    propagator.register_created(&mut solver).expect("live");

    let f = declare_function(&mut solver, "f", &[Sort::Int], Sort::Bool).expect("valid signature");
    let zero = solver.terms().mk_int(0);
    let first = solver.terms().mk_app(f, &[zero]).expect("well sorted");
    let second = solver.terms().mk_app(f, &[zero]).expect("well sorted");
    solver.assert(first).expect("encodable");
    solver.assert(second).expect("encodable");

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Satisfiable, result);
    assert_eq!(first, second);
    let num_created = propagator
        .with_handler(|tracker: &mut Tracker| tracker.count(&Event::Created(first)))
        .expect("a tracker");
    assert_eq!(1, num_created);
}

#[test]
fn equalities_of_registered_terms_are_reported() {
    let mut solver = Solver::default();
    let a = solver.terms().mk_bv_const("a", 2).expect("valid width");
    let b = solver.terms().mk_bv_const("b", 2).expect("valid width");
    let c = solver.terms().mk_bv_const("c", 2).expect("valid width");
    let equal = solver.terms().mk_eq(a, b).expect("same sort");
    let different = solver.terms().mk_eq(a, c).expect("same sort");
    let not_different = solver.terms().mk_not(different).expect("Boolean");
    solver.assert(equal).expect("encodable");
    solver.assert(not_different).expect("encodable");

    let propagator = attach_tracker(&mut solver, &[a, b, c]);
    propagator.register_eq(&mut solver).expect("live");
    propagator.register_diseq(&mut solver).expect("live");

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Satisfiable, result);
    let events = events(&propagator);
    assert!(events.contains(&Event::Equality(a, b)));
    assert!(events.contains(&Event::Disequality(a, c)));
    assert_ne!(solver.bv_value(a), solver.bv_value(c));
}

/// Insists on `required` being true once everything else is decided.
#[derive(Debug)]
struct Insist {
    required: Term,
    num_final_checks: usize,
}

impl UserPropagatorCallbacks for Insist {
    fn push(&mut self) {}

    fn pop(&mut self, _num_scopes: u32) {}

    fn fresh(&mut self, _context: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks> {
        Box::new(Insist {
            required: self.required,
            num_final_checks: 0,
        })
    }

    fn as_final(&mut self) -> Option<&mut dyn FinalHandler> {
        Some(self)
    }
}

impl FinalHandler for Insist {
    fn final_check(&mut self, context: &mut PropagatorContext<'_>) {
        self.num_final_checks += 1;
        let _ = context
            .consequence(&[], self.required)
            .expect("inside a callback");
    }
}

#[test]
fn final_checks_can_extend_the_search() {
    let mut solver = Solver::default();
    let x = solver.terms().mk_bool_const("x");
    let y = solver.terms().mk_bool_const("y");
    let either = solver.terms().mk_or(&[x, y]).expect("Boolean");
    solver.assert(either).expect("encodable");

    let propagator = UserPropagator::attach(
        &mut solver,
        Insist {
            required: x,
            num_final_checks: 0,
        },
    )
    .expect("nothing attached");
    propagator.register_final(&mut solver).expect("live");

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Satisfiable, result);
    assert_eq!(Some(true), solver.bool_value(x));
    let num_final_checks = propagator
        .with_handler(|handler: &mut Insist| handler.num_final_checks)
        .expect("an insist");
    assert_eq!(2, num_final_checks);
}

#[test]
fn only_one_propagator_is_attached_at_a_time() {
    let mut solver = Solver::default();
    let mut first = attach_tracker(&mut solver, &[]);

    let second = UserPropagator::attach(&mut solver, Tracker::default());
    assert!(matches!(second, Err(BridgeError::IllegalState(_))));

    first.close().expect("not searching");
    let third = UserPropagator::attach(&mut solver, Tracker::default());
    assert!(third.is_ok());
}

#[test]
fn closed_propagators_are_not_notified() {
    let mut solver = Solver::default();
    let x = solver.terms().mk_bool_const("x");
    let mut propagator = attach_tracker(&mut solver, &[x]);
    propagator.register_fixed(&mut solver).expect("live");
    let handle = propagator.handle();

    propagator.close().expect("not searching");
    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Satisfiable, result);
    assert!(!upbridge_core::handles::is_live(handle));
    assert_eq!(
        Err(BridgeError::InvalidHandle(handle)),
        propagator.scope_depth()
    );
}
