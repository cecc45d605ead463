use super::check_registrable;
use super::EngineContext;
use super::EventKind;
use super::Phase;
use super::PropagatorState;
use super::SolverCallback;
use crate::terms::Sort;
use crate::terms::Term;
use crate::terms::TermStore;
use crate::BridgeError;

/// The callback context handed to a handler for the duration of one notification.
///
/// It is the only way to feed information back into the search step that is in progress; the
/// context cannot outlive the notification, so a stale context cannot be used.
pub struct PropagatorContext<'a> {
    state: &'a mut PropagatorState,
    callback: &'a mut dyn SolverCallback,
}

impl std::fmt::Debug for PropagatorContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagatorContext")
            .field("active", &self.state.active)
            .finish_non_exhaustive()
    }
}

impl<'a> PropagatorContext<'a> {
    pub(crate) fn new(
        state: &'a mut PropagatorState,
        callback: &'a mut dyn SolverCallback,
    ) -> Self {
        PropagatorContext { state, callback }
    }

    /// The event which is being delivered.
    pub fn active_event(&self) -> Option<EventKind> {
        self.state.active
    }

    pub fn scope_depth(&self) -> usize {
        self.state.scoped_terms.scope()
    }

    pub fn terms(&mut self) -> &mut TermStore {
        self.callback.terms()
    }

    /// Whether `term` is registered, globally or in one of the open scopes.
    pub fn is_registered(&self, term: Term) -> bool {
        self.state.is_registered(term)
    }

    /// Registers `term` until the engine backtracks past the current scope.
    pub fn add(&mut self, term: Term) -> Result<(), BridgeError> {
        check_registrable(term)?;
        if self.state.is_registered(term) {
            return Ok(());
        }

        self.state.scoped_terms.push(term);
        self.callback.register_term(term);
        Ok(())
    }

    /// Proposes that `consequence` holds whenever the terms in `fixed` have their current values.
    ///
    /// Returns whether the engine accepted the consequence; a rejection means it had no effect.
    pub fn consequence(
        &mut self,
        fixed: &[Term],
        consequence: Term,
    ) -> Result<bool, BridgeError> {
        self.propagate(fixed, &[], consequence)
    }

    /// As [`PropagatorContext::consequence`], with the additional premises `lhs[i] = rhs[i]`.
    pub fn consequence_with_eqs(
        &mut self,
        fixed: &[Term],
        lhs: &[Term],
        rhs: &[Term],
        consequence: Term,
    ) -> Result<bool, BridgeError> {
        if lhs.len() != rhs.len() {
            return Err(BridgeError::InvalidArgument(format!(
                "{} left-hand sides were paired with {} right-hand sides",
                lhs.len(),
                rhs.len()
            )));
        }

        let equalities = lhs
            .iter()
            .copied()
            .zip(rhs.iter().copied())
            .collect::<Vec<_>>();
        self.propagate(fixed, &equalities, consequence)
    }

    pub fn propagate(
        &mut self,
        fixed: &[Term],
        equalities: &[(Term, Term)],
        consequence: Term,
    ) -> Result<bool, BridgeError> {
        if consequence.sort() != Sort::Bool {
            return Err(BridgeError::InvalidArgument(format!(
                "a consequence is a Boolean term, not a term of sort {}",
                consequence.sort()
            )));
        }
        if let Some((lhs, rhs)) = equalities.iter().find(|(lhs, rhs)| lhs.sort() != rhs.sort()) {
            return Err(BridgeError::InvalidArgument(format!(
                "an equality premise relates sorts {} and {}",
                lhs.sort(),
                rhs.sort()
            )));
        }

        let accepted = self
            .callback
            .propagate_consequence(fixed, equalities, consequence);
        if accepted {
            self.state.statistics.consequences_accepted += 1;
        } else {
            self.state.statistics.consequences_rejected += 1;
        }
        Ok(accepted)
    }

    /// Replaces the decision the engine announced with a decision on bit `bit_index` of `term`.
    ///
    /// Only legal while a decision is being delivered.
    pub fn next_split(
        &mut self,
        term: Term,
        bit_index: u32,
        phase: Phase,
    ) -> Result<bool, BridgeError> {
        if self.state.active != Some(EventKind::Decide) {
            return Err(BridgeError::IllegalState(
                "a decision can only be overridden while a decision is being delivered",
            ));
        }
        check_registrable(term)?;
        if term.sort().num_bits().is_some_and(|bits| bit_index >= bits) {
            return Err(BridgeError::InvalidArgument(format!(
                "bit {bit_index} does not exist in a term of sort {}",
                term.sort()
            )));
        }

        let accepted = self.callback.next_split(term, bit_index, phase);
        if accepted {
            self.state.statistics.overrides_accepted += 1;
        } else {
            self.state.statistics.overrides_rejected += 1;
        }
        Ok(accepted)
    }
}

/// The context handed to [`super::UserPropagatorCallbacks::fresh`].
///
/// It refers to the derived engine context, not the one the forking handler is attached to.
pub struct FreshContext<'a> {
    engine: &'a mut dyn EngineContext,
    pending: Vec<Term>,
}

impl std::fmt::Debug for FreshContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreshContext")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl<'a> FreshContext<'a> {
    pub(crate) fn new(engine: &'a mut dyn EngineContext) -> Self {
        FreshContext {
            engine,
            pending: Vec::new(),
        }
    }

    pub fn terms(&mut self) -> &mut TermStore {
        self.engine.terms()
    }

    /// Registers `term` with the propagator of the derived context once it is attached.
    pub fn add(&mut self, term: Term) -> Result<(), BridgeError> {
        check_registrable(term)?;
        self.pending.push(term);
        Ok(())
    }

    pub(crate) fn into_pending(self) -> Vec<Term> {
        self.pending
    }
}
