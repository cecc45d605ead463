//! Handlers shared by the integration tests of the solver.
#![allow(
    dead_code,
    reason = "is used in integration tests but unable to find a way to silence these warnings"
)]

use upbridge_core::propagation::CreatedHandler;
use upbridge_core::propagation::DiseqHandler;
use upbridge_core::propagation::EqHandler;
use upbridge_core::propagation::FinalHandler;
use upbridge_core::propagation::FixedHandler;
use upbridge_core::propagation::FreshContext;
use upbridge_core::propagation::PropagatorContext;
use upbridge_core::propagation::UserPropagator;
use upbridge_core::propagation::UserPropagatorCallbacks;
use upbridge_core::terms::Term;
use upbridge_engine::Solver;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Push,
    Pop(u32),
    Fixed(Term, Term),
    Final,
    Equality(Term, Term),
    Disequality(Term, Term),
    Created(Term),
}

/// Records every event it receives; its clones watch the same terms.
#[derive(Debug, Default)]
pub(crate) struct Tracker {
    pub(crate) watched: Vec<Term>,
    pub(crate) events: Vec<Event>,
}

impl Tracker {
    pub(crate) fn fixed_events(&self) -> Vec<(Term, Term)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Fixed(term, value) => Some((*term, *value)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|other| *other == event).count()
    }
}

impl UserPropagatorCallbacks for Tracker {
    fn name(&self) -> &str {
        "Tracker"
    }

    fn push(&mut self) {
        self.events.push(Event::Push);
    }

    fn pop(&mut self, num_scopes: u32) {
        self.events.push(Event::Pop(num_scopes));
    }

    fn fresh(&mut self, context: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks> {
        for &term in &self.watched {
            context.add(term).expect("registrable");
        }
        Box::new(Tracker {
            watched: self.watched.clone(),
            events: Vec::new(),
        })
    }

    fn as_fixed(&mut self) -> Option<&mut dyn FixedHandler> {
        Some(self)
    }

    fn as_final(&mut self) -> Option<&mut dyn FinalHandler> {
        Some(self)
    }

    fn as_eq(&mut self) -> Option<&mut dyn EqHandler> {
        Some(self)
    }

    fn as_diseq(&mut self) -> Option<&mut dyn DiseqHandler> {
        Some(self)
    }

    fn as_created(&mut self) -> Option<&mut dyn CreatedHandler> {
        Some(self)
    }
}

impl FixedHandler for Tracker {
    fn fixed(&mut self, _context: &mut PropagatorContext<'_>, term: Term, value: Term) {
        self.events.push(Event::Fixed(term, value));
    }
}

impl FinalHandler for Tracker {
    fn final_check(&mut self, _context: &mut PropagatorContext<'_>) {
        self.events.push(Event::Final);
    }
}

impl EqHandler for Tracker {
    fn equality(&mut self, _context: &mut PropagatorContext<'_>, lhs: Term, rhs: Term) {
        self.events.push(Event::Equality(lhs, rhs));
    }
}

impl DiseqHandler for Tracker {
    fn disequality(&mut self, _context: &mut PropagatorContext<'_>, lhs: Term, rhs: Term) {
        self.events.push(Event::Disequality(lhs, rhs));
    }
}

impl CreatedHandler for Tracker {
    fn created(&mut self, _context: &mut PropagatorContext<'_>, term: Term) {
        self.events.push(Event::Created(term));
    }
}

/// Routes the solver's log output through the test harness; set `RUST_LOG` to see it.
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Attaches a [`Tracker`] to `solver` which watches `terms`.
pub(crate) fn attach_tracker(solver: &mut Solver, terms: &[Term]) -> UserPropagator {
    init_logging();
    let propagator = UserPropagator::attach(
        solver,
        Tracker {
            watched: terms.to_vec(),
            events: Vec::new(),
        },
    )
    .expect("nothing else is attached");
    for &term in terms {
        propagator.add(solver, term).expect("registrable");
    }
    propagator
}

pub(crate) fn events(propagator: &UserPropagator) -> Vec<Event> {
    propagator
        .with_handler(|tracker: &mut Tracker| tracker.events.clone())
        .expect("a tracker")
}

pub(crate) fn fixed_events(propagator: &UserPropagator) -> Vec<(Term, Term)> {
    propagator
        .with_handler(|tracker: &mut Tracker| tracker.fixed_events())
        .expect("a tracker")
}
