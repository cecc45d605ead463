#![cfg(test)] // workaround for https://github.com/rust-lang/rust-clippy/issues/11024

mod helpers;

use helpers::attach_tracker;
use upbridge_core::propagation::FreshContext;
use upbridge_core::propagation::OnBindingHandler;
use upbridge_core::propagation::PropagatorContext;
use upbridge_core::propagation::UserPropagator;
use upbridge_core::propagation::UserPropagatorCallbacks;
use upbridge_core::terms::Term;
use upbridge_engine::termination::Indefinite;
use upbridge_engine::SatisfactionResult;
use upbridge_engine::Solver;

/// Asserts `forall v. v != 1` together with `c = 1`.
fn assert_contradicted_quantifier(solver: &mut Solver) {
    let v = solver.terms().mk_int_const("v");
    let c = solver.terms().mk_int_const("c");
    let one = solver.terms().mk_int(1);
    let v_is_one = solver.terms().mk_eq(v, one).expect("same sort");
    let body = solver.terms().mk_not(v_is_one).expect("Boolean");
    let quantifier = solver.terms().mk_forall(&[v], body).expect("a bound constant");
    let c_is_one = solver.terms().mk_eq(c, one).expect("same sort");

    solver.assert(quantifier).expect("encodable");
    solver.assert(c_is_one).expect("encodable");
}

/// Blocks every binding it is offered.
#[derive(Debug, Default)]
struct Blocker {
    offered: Vec<(Term, Term)>,
}

impl UserPropagatorCallbacks for Blocker {
    fn push(&mut self) {}

    fn pop(&mut self, _num_scopes: u32) {}

    fn fresh(&mut self, _context: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks> {
        Box::new(Blocker::default())
    }

    fn as_on_binding(&mut self) -> Option<&mut dyn OnBindingHandler> {
        Some(self)
    }
}

impl OnBindingHandler for Blocker {
    fn on_binding(
        &mut self,
        _context: &mut PropagatorContext<'_>,
        quantifier: Term,
        instance: Term,
    ) -> bool {
        self.offered.push((quantifier, instance));
        false
    }
}

#[test]
fn quantifiers_are_instantiated_with_ground_terms() {
    let mut solver = Solver::default();
    assert_contradicted_quantifier(&mut solver);

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Unsatisfiable, result);
    assert!(solver.statistics().num_instantiations >= 1);
}

#[test]
fn bindings_are_allowed_when_the_handler_has_no_opinion() {
    let mut solver = Solver::default();
    let propagator = attach_tracker(&mut solver, &[]);
    propagator.register_on_binding(&mut solver).expect("live");
    assert_contradicted_quantifier(&mut solver);

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Unsatisfiable, result);
    assert_eq!(0, solver.statistics().num_blocked_instantiations);
}

#[test]
fn blocked_bindings_are_not_instantiated() {
    let mut solver = Solver::default();
    let propagator =
        UserPropagator::attach(&mut solver, Blocker::default()).expect("nothing attached");
    propagator.register_on_binding(&mut solver).expect("live");
    assert_contradicted_quantifier(&mut solver);

    let result = solver.solve(&mut Indefinite).expect("no errors");

    assert_eq!(SatisfactionResult::Satisfiable, result);
    let offered = propagator
        .with_handler(|blocker: &mut Blocker| blocker.offered.clone())
        .expect("a blocker");
    assert_eq!(2, offered.len());
    assert_eq!(2, solver.statistics().num_blocked_instantiations);
    assert_eq!(0, solver.statistics().num_instantiations);
    assert_eq!(2, propagator.statistics().expect("live").bindings_blocked);
}
