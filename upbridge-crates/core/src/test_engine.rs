//! A scripted engine which sends one notification at a time, for testing the boundary without a
//! search behind it.
#![cfg(any(test, doc))]

use crate::basic_types::Trail;
use crate::containers::HashSet;
use crate::handles::is_live;
use crate::handles::Handle;
use crate::observer::notify_clause;
use crate::observer::ClauseRecord;
use crate::observer::ProofHint;
use crate::propagation::router;
use crate::propagation::Capability;
use crate::propagation::CapabilitySet;
use crate::propagation::EngineContext;
use crate::propagation::FixedHandler;
use crate::propagation::FreshContext;
use crate::propagation::Phase;
use crate::propagation::PropagatorContext;
use crate::propagation::SearchActivity;
use crate::propagation::SearchGuard;
use crate::propagation::SolverCallback;
use crate::propagation::UserPropagator;
use crate::propagation::UserPropagatorCallbacks;
use crate::terms::Term;
use crate::terms::TermStore;
use crate::BridgeError;

pub(crate) type Consequence = (Vec<Term>, Vec<(Term, Term)>, Term);

#[derive(Debug, Default)]
pub(crate) struct TestEngine {
    pub(crate) terms: TermStore,
    propagator: Option<Handle>,
    enabled: CapabilitySet,
    global_terms: HashSet<Term>,
    scoped_terms: Trail<Term>,
    observers: Vec<Handle>,
    search: SearchActivity,
    /// Whether consequences and decision overrides are accepted.
    pub(crate) accepting: bool,
    pub(crate) consequences: Vec<Consequence>,
    split: Option<(Term, u32, Phase)>,
}

impl TestEngine {
    pub(crate) fn new() -> TestEngine {
        TestEngine {
            accepting: true,
            ..Default::default()
        }
    }

    fn propagator(&self) -> Result<Handle, BridgeError> {
        self.propagator
            .filter(|&handle| is_live(handle))
            .ok_or(BridgeError::IllegalState("no propagator is attached"))
    }

    pub(crate) fn is_registered(&self, term: Term) -> bool {
        self.global_terms.contains(&term) || self.scoped_terms.contains(&term)
    }

    pub(crate) fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled.contains(capability)
    }

    pub(crate) fn start_search(&self) -> SearchGuard {
        self.search.enter()
    }

    pub(crate) fn push(&mut self) -> Result<(), BridgeError> {
        self.scoped_terms.new_scope();
        router::push(self.propagator()?)
    }

    pub(crate) fn pop(&mut self, num_scopes: u32) -> Result<(), BridgeError> {
        let handle = self.propagator()?;
        let to_pop = (num_scopes as usize).min(self.scoped_terms.scope());
        let _ = self.scoped_terms.pop_scopes(to_pop).count();
        router::pop(handle, num_scopes)
    }

    pub(crate) fn fix(&mut self, term: Term, value: Term) -> Result<(), BridgeError> {
        let handle = self.propagator()?;
        if self.is_enabled(Capability::Fixed) && self.is_registered(term) {
            router::fixed(handle, self, term, value)?;
        }
        Ok(())
    }

    pub(crate) fn final_check(&mut self) -> Result<(), BridgeError> {
        let handle = self.propagator()?;
        if self.is_enabled(Capability::Final) {
            router::final_check(handle, self)?;
        }
        Ok(())
    }

    pub(crate) fn equality(&mut self, lhs: Term, rhs: Term) -> Result<(), BridgeError> {
        let handle = self.propagator()?;
        if self.is_enabled(Capability::Eq) {
            router::equality(handle, self, lhs, rhs)?;
        }
        Ok(())
    }

    pub(crate) fn disequality(&mut self, lhs: Term, rhs: Term) -> Result<(), BridgeError> {
        let handle = self.propagator()?;
        if self.is_enabled(Capability::Diseq) {
            router::disequality(handle, self, lhs, rhs)?;
        }
        Ok(())
    }

    pub(crate) fn created(&mut self, term: Term) -> Result<(), BridgeError> {
        let handle = self.propagator()?;
        if self.is_enabled(Capability::Created) {
            router::created(handle, self, term)?;
        }
        Ok(())
    }

    /// Announces a decision and returns the override the propagator made, if it was accepted.
    pub(crate) fn decide(
        &mut self,
        term: Term,
        bit_index: u32,
        phase: bool,
    ) -> Result<Option<(Term, u32, Phase)>, BridgeError> {
        let handle = self.propagator()?;
        self.split = None;
        if self.is_enabled(Capability::Decide) {
            router::decide(handle, self, term, bit_index, phase)?;
        }
        Ok(self.split.take())
    }

    pub(crate) fn bind(&mut self, quantifier: Term, instance: Term) -> Result<bool, BridgeError> {
        let handle = self.propagator()?;
        if self.is_enabled(Capability::OnBinding) {
            router::on_binding(handle, self, quantifier, instance)
        } else {
            Ok(true)
        }
    }

    /// Derives a new context with the same terms, and forks the attached propagator into it.
    pub(crate) fn fork(&mut self) -> Result<(TestEngine, UserPropagator), BridgeError> {
        let handle = self.propagator()?;
        let mut child = TestEngine {
            terms: self.terms.clone(),
            ..TestEngine::new()
        };
        let propagator = router::fresh(handle, &mut child)?;
        Ok((child, propagator))
    }

    pub(crate) fn clause(
        &mut self,
        literals: &[Term],
        hint: Option<ProofHint>,
        dependencies: &[u64],
    ) -> Result<(), BridgeError> {
        self.observers.retain(|&handle| is_live(handle));
        let record = ClauseRecord::new(literals, hint, dependencies);
        for &observer in &self.observers {
            notify_clause(observer, &record)?;
        }
        Ok(())
    }
}

impl EngineContext for TestEngine {
    fn propagate_init(&mut self, handle: Handle) -> Result<(), BridgeError> {
        if self.propagator.is_some_and(is_live) {
            return Err(BridgeError::IllegalState(
                "a propagator is already attached",
            ));
        }
        self.propagator = Some(handle);
        self.enabled = CapabilitySet::empty();
        self.global_terms.clear();
        Ok(())
    }

    fn propagate_enable(&mut self, _handle: Handle, capability: Capability) {
        let _ = self.enabled.insert(capability);
    }

    fn propagate_register(&mut self, _handle: Handle, term: Term) {
        let _ = self.global_terms.insert(term);
    }

    fn register_on_clause(&mut self, handle: Handle) -> Result<(), BridgeError> {
        self.observers.push(handle);
        Ok(())
    }

    fn unregister_on_clause(&mut self, handle: Handle) {
        self.observers.retain(|&observer| observer != handle);
    }

    fn search_activity(&self) -> SearchActivity {
        self.search.clone()
    }

    fn terms(&mut self) -> &mut TermStore {
        &mut self.terms
    }
}

impl SolverCallback for TestEngine {
    fn register_term(&mut self, term: Term) {
        self.scoped_terms.push(term);
    }

    fn propagate_consequence(
        &mut self,
        fixed: &[Term],
        equalities: &[(Term, Term)],
        consequence: Term,
    ) -> bool {
        if self.accepting {
            self.consequences
                .push((fixed.to_vec(), equalities.to_vec(), consequence));
        }
        self.accepting
    }

    fn next_split(&mut self, term: Term, bit_index: u32, phase: Phase) -> bool {
        if self.accepting {
            self.split = Some((term, bit_index, phase));
        }
        self.accepting
    }

    fn terms(&mut self) -> &mut TermStore {
        &mut self.terms
    }
}

/// A handler implementing only the mandatory callbacks, which counts them.
#[derive(Debug, Default)]
pub(crate) struct Minimal {
    pub(crate) pushes: usize,
    pub(crate) popped: u32,
    pub(crate) forks: usize,
}

impl UserPropagatorCallbacks for Minimal {
    fn push(&mut self) {
        self.pushes += 1;
    }

    fn pop(&mut self, num_scopes: u32) {
        self.popped += num_scopes;
    }

    fn fresh(&mut self, _context: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks> {
        self.forks += 1;
        Box::new(Minimal::default())
    }
}

type FixedHook = Box<dyn FnMut(&mut PropagatorContext<'_>, Term, Term) + Send>;

/// A handler implementing the fixed capability, which runs an optional hook for every fixed
/// term.
#[derive(Default)]
pub(crate) struct OnFixed {
    pub(crate) fixed: Vec<(Term, Term)>,
    pub(crate) pops: Vec<u32>,
    pub(crate) hook: Option<FixedHook>,
}

impl std::fmt::Debug for OnFixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnFixed")
            .field("fixed", &self.fixed)
            .field("pops", &self.pops)
            .finish_non_exhaustive()
    }
}

impl OnFixed {
    pub(crate) fn with_hook(
        hook: impl FnMut(&mut PropagatorContext<'_>, Term, Term) + Send + 'static,
    ) -> OnFixed {
        let mut handler = OnFixed::default();
        handler.set_hook(hook);
        handler
    }

    pub(crate) fn set_hook(
        &mut self,
        hook: impl FnMut(&mut PropagatorContext<'_>, Term, Term) + Send + 'static,
    ) {
        self.hook = Some(Box::new(hook));
    }
}

impl UserPropagatorCallbacks for OnFixed {
    fn push(&mut self) {}

    fn pop(&mut self, num_scopes: u32) {
        self.pops.push(num_scopes);
    }

    fn fresh(&mut self, _context: &mut FreshContext<'_>) -> Box<dyn UserPropagatorCallbacks> {
        Box::new(OnFixed::default())
    }

    fn as_fixed(&mut self) -> Option<&mut dyn FixedHandler> {
        Some(self)
    }
}

impl FixedHandler for OnFixed {
    fn fixed(&mut self, context: &mut PropagatorContext<'_>, term: Term, value: Term) {
        self.fixed.push((term, value));
        if let Some(hook) = self.hook.as_mut() {
            hook(context, term, value);
        }
    }
}
