//! The solver side of the user-propagator boundary.
//!
//! The solver keeps the handle of at most one attached propagator together with the
//! registrations it made, and sends it notifications through the router. Inside a notification
//! the propagator talks back through an [`EngineCallback`], which borrows the solver for exactly
//! that call.
use log::debug;
use log::warn;
use upbridge_core::containers::HashMap;
use upbridge_core::containers::HashSet;
use upbridge_core::handles::is_live;
use upbridge_core::observer::ProofHint;
use upbridge_core::propagation::router;
use upbridge_core::propagation::Capability;
use upbridge_core::propagation::CapabilitySet;
use upbridge_core::propagation::Phase;
use upbridge_core::propagation::SolverCallback;
use upbridge_core::terms::Term;
use upbridge_core::terms::TermStore;
use upbridge_core::BridgeError;
use upbridge_core::Handle;
use upbridge_core::Trail;

use crate::sat::Literal;
use crate::sat::Variable;
use crate::Solver;
use crate::SolverError;

/// The registrations of the attached user propagator.
#[derive(Debug, Default)]
pub(crate) struct UserHookup {
    handle: Option<Handle>,
    enabled: CapabilitySet,
    global: HashSet<Term>,
    /// One scope per decision level.
    scoped: Trail<Term>,
    /// For every variable, the terms which it is a bit of and which have been registered at some
    /// point.
    interest: HashMap<Variable, Vec<Term>>,
    /// The decision requested by the propagator during the current decide event.
    pub(crate) split: Option<Literal>,
    /// The position on the trail up to which the propagator has been notified.
    pub(crate) notified: usize,
}

impl UserHookup {
    /// The handle of the attached propagator, as long as it has not been closed.
    pub(crate) fn live_handle(&self) -> Option<Handle> {
        self.handle.filter(|&handle| is_live(handle))
    }

    /// The live handle, if the propagator asked for the events of `capability`.
    pub(crate) fn wants(&self, capability: Capability) -> Option<Handle> {
        self.live_handle()
            .filter(|_| self.enabled.contains(capability))
    }

    pub(crate) fn is_registered(&self, term: Term) -> bool {
        self.global.contains(&term) || self.scoped.contains(&term)
    }

    pub(crate) fn new_scope(&mut self) {
        self.scoped.new_scope();
    }

    pub(crate) fn backtrack(&mut self, level: usize, trail_len: usize) {
        let _ = self.scoped.backtrack_to(level).count();
        self.notified = self.notified.min(trail_len);
    }

    /// Forgets a propagator which has been closed since it was attached.
    pub(crate) fn drop_stale(&mut self) {
        if let Some(handle) = self.handle {
            if !is_live(handle) {
                debug!("Dropping the closed propagator {handle}");
                *self = UserHookup::default();
            }
        }
    }
}

/// A notification for the attached propagator derived from a single assignment.
enum Notification {
    Fixed(Term, Term),
    Equality(Term, Term),
    Disequality(Term, Term),
}

/// The view of the solver a propagator receives for the duration of one notification.
pub(crate) struct EngineCallback<'a> {
    solver: &'a mut Solver,
}

impl<'a> EngineCallback<'a> {
    pub(crate) fn new(solver: &'a mut Solver) -> Self {
        EngineCallback { solver }
    }
}

impl SolverCallback for EngineCallback<'_> {
    fn register_term(&mut self, term: Term) {
        self.solver.user.scoped.push(term);
        if let Err(error) = self.solver.watch(term) {
            warn!("Registered a term which cannot be watched: {error}");
        }
    }

    fn propagate_consequence(
        &mut self,
        fixed: &[Term],
        equalities: &[(Term, Term)],
        consequence: Term,
    ) -> bool {
        match self
            .solver
            .consequence_clause(fixed, equalities, consequence)
        {
            Ok(Some(clause)) => {
                self.solver.queue_clause(clause, ProofHint::PropagatorLemma);
                self.solver.statistics.num_propagator_lemmas += 1;
                true
            }
            Ok(None) => false,
            Err(error) => {
                warn!("Declined a consequence: {error}");
                false
            }
        }
    }

    fn next_split(&mut self, term: Term, bit_index: u32, phase: Phase) -> bool {
        let Ok(bits) = self.solver.term_bits(term) else {
            return false;
        };
        let Some(&bit) = bits.get(bit_index as usize) else {
            return false;
        };
        if self.solver.assignments.is_assigned(bit.variable()) {
            return false;
        }

        let value = phase
            .preferred_value()
            .unwrap_or(self.solver.options.default_phase.value());
        self.solver.user.split = Some(if value { bit } else { !bit });
        true
    }

    fn terms(&mut self) -> &mut TermStore {
        &mut self.solver.terms
    }
}

impl Solver {
    pub(crate) fn attach_propagator(&mut self, handle: Handle) -> Result<(), BridgeError> {
        if let Some(current) = self.user.live_handle() {
            warn!("{handle} cannot be attached while {current} is attached");
            return Err(BridgeError::IllegalState(
                "a user propagator is already attached",
            ));
        }

        self.backtrack_silently(0);
        self.user = UserHookup {
            handle: Some(handle),
            ..UserHookup::default()
        };
        debug!("Attached {handle}");
        Ok(())
    }

    pub(crate) fn enable(&mut self, handle: Handle, capability: Capability) {
        if self.user.handle == Some(handle) {
            let _ = self.user.enabled.insert(capability);
        }
    }

    pub(crate) fn register_globally(&mut self, handle: Handle, term: Term) {
        if self.user.handle != Some(handle) {
            return;
        }
        let _ = self.user.global.insert(term);
        if let Err(error) = self.watch(term) {
            warn!("Registered a term which cannot be watched: {error}");
        }
    }

    /// Makes the bits of `term` report their assignments to the propagator.
    fn watch(&mut self, term: Term) -> Result<(), SolverError> {
        for literal in self.term_bits(term)? {
            let terms = self.user.interest.entry(literal.variable()).or_default();
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        Ok(())
    }

    pub(crate) fn notify_push(&mut self) -> Result<(), BridgeError> {
        self.user.new_scope();
        match self.user.live_handle() {
            Some(handle) => router::push(handle),
            None => Ok(()),
        }
    }

    pub(crate) fn notify_pop(&mut self, num_scopes: usize) -> Result<(), BridgeError> {
        match self.user.live_handle() {
            Some(handle) => router::pop(handle, num_scopes as u32),
            None => Ok(()),
        }
    }

    /// Sends the propagator every event caused by the assignments it has not yet seen.
    pub(crate) fn notify_propagator(&mut self) -> Result<(), SolverError> {
        let created = std::mem::take(&mut self.encoding.pending_created);
        let Some(handle) = self.user.live_handle() else {
            self.user.notified = self.assignments.trail().len();
            return Ok(());
        };

        if self.user.enabled.contains(Capability::Created) {
            for term in created {
                router::created(handle, &mut EngineCallback::new(self), term)?;
            }
        }

        while self.user.notified < self.assignments.trail().len() {
            let position = self.user.notified;
            self.user.notified += 1;

            for notification in self.notifications(position)? {
                let mut callback = EngineCallback::new(self);
                match notification {
                    Notification::Fixed(term, value) => {
                        router::fixed(handle, &mut callback, term, value)?
                    }
                    Notification::Equality(lhs, rhs) => {
                        router::equality(handle, &mut callback, lhs, rhs)?
                    }
                    Notification::Disequality(lhs, rhs) => {
                        router::disequality(handle, &mut callback, lhs, rhs)?
                    }
                }
            }
        }

        Ok(())
    }

    fn notifications(&mut self, position: usize) -> Result<Vec<Notification>, SolverError> {
        let variable = self.assignments.trail()[position].variable();
        let mut notifications = Vec::new();

        if self.user.enabled.contains(Capability::Fixed) {
            let terms = self
                .user
                .interest
                .get(&variable)
                .cloned()
                .unwrap_or_default();
            for term in terms {
                if !self.user.is_registered(term) || !self.is_completed_at(term, position)? {
                    continue;
                }
                if let Some(value) = self.value_term(term)? {
                    notifications.push(Notification::Fixed(term, value));
                }
            }
        }

        if let Some((lhs, rhs)) = self.encoding.equality(variable) {
            if self.user.is_registered(lhs) && self.user.is_registered(rhs) {
                match self.assignments.value(variable) {
                    Some(true) if self.user.enabled.contains(Capability::Eq) => {
                        notifications.push(Notification::Equality(lhs, rhs))
                    }
                    Some(false) if self.user.enabled.contains(Capability::Diseq) => {
                        notifications.push(Notification::Disequality(lhs, rhs))
                    }
                    _ => {}
                }
            }
        }

        Ok(notifications)
    }

    /// Whether the assignment at `position` is the one which fixed the last bit of `term`.
    fn is_completed_at(&mut self, term: Term, position: usize) -> Result<bool, SolverError> {
        let bits = self.term_bits(term)?;
        let mut last = 0;
        for literal in bits {
            let variable = literal.variable();
            if !self.assignments.is_assigned(variable) {
                return Ok(false);
            }
            last = last.max(self.assignments.position(variable));
        }
        Ok(last == position)
    }

    pub(crate) fn notify_final(&mut self) -> Result<(), BridgeError> {
        match self.user.wants(Capability::Final) {
            Some(handle) => router::final_check(handle, &mut EngineCallback::new(self)),
            None => Ok(()),
        }
    }

    /// Offers the decision on `variable` to the propagator; returns the decision it asked for
    /// instead, if any.
    pub(crate) fn offer_decision(
        &mut self,
        variable: Variable,
        phase: bool,
    ) -> Result<Option<Literal>, SolverError> {
        let Some(handle) = self.user.wants(Capability::Decide) else {
            return Ok(None);
        };
        let Some(term) = self.user.interest.get(&variable).and_then(|terms| {
            terms
                .iter()
                .copied()
                .find(|&term| self.user.is_registered(term))
        }) else {
            return Ok(None);
        };
        let Some(bit_index) = self
            .term_bits(term)?
            .iter()
            .position(|literal| literal.variable() == variable)
        else {
            return Ok(None);
        };

        self.user.split = None;
        router::decide(
            handle,
            &mut EngineCallback::new(self),
            term,
            bit_index as u32,
            phase,
        )?;
        Ok(self.user.split.take())
    }

    pub(crate) fn allow_binding(
        &mut self,
        quantifier: Term,
        instance: Term,
    ) -> Result<bool, BridgeError> {
        match self.user.wants(Capability::OnBinding) {
            Some(handle) => {
                router::on_binding(handle, &mut EngineCallback::new(self), quantifier, instance)
            }
            None => Ok(true),
        }
    }

    /// The clause which makes `consequence` follow from the premises, or `None` when the premises
    /// do not hold or the consequence already does.
    fn consequence_clause(
        &mut self,
        fixed: &[Term],
        equalities: &[(Term, Term)],
        consequence: Term,
    ) -> Result<Option<Vec<Literal>>, SolverError> {
        let mut clause = Vec::new();

        for &term in fixed {
            match self.true_literals(term)? {
                Some(premises) => clause.extend(premises.into_iter().map(|literal| !literal)),
                None => return Ok(None),
            }
        }

        for &(lhs, rhs) in equalities {
            let atom = self.terms.mk_eq(lhs, rhs)?;
            if let Some(literal) = self.encoding.cached_literal(atom) {
                if self.assignments.is_true(literal) {
                    clause.push(!literal);
                    continue;
                }
            }

            let (Some(lhs_premises), Some(rhs_premises)) =
                (self.true_literals(lhs)?, self.true_literals(rhs)?)
            else {
                return Ok(None);
            };
            if self.value_term(lhs)? != self.value_term(rhs)? {
                return Ok(None);
            }
            clause.extend(
                lhs_premises
                    .into_iter()
                    .chain(rhs_premises)
                    .map(|literal| !literal),
            );
        }

        let literal = self.literal(consequence)?;
        if self.assignments.is_true(literal) {
            return Ok(None);
        }
        clause.push(literal);
        Ok(Some(clause))
    }

    /// The literals which currently hold for the bits of `term`, if it is fixed.
    fn true_literals(&mut self, term: Term) -> Result<Option<Vec<Literal>>, SolverError> {
        Ok(self
            .term_bits(term)?
            .into_iter()
            .map(|literal| {
                let value = self.assignments.literal_value(literal)?;
                Some(if value { literal } else { !literal })
            })
            .collect())
    }
}
