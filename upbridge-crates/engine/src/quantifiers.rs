use itertools::Itertools;
use log::trace;
use upbridge_core::containers::HashMap;
use upbridge_core::containers::HashSet;
use upbridge_core::observer::ProofHint;
use upbridge_core::terms::Sort;
use upbridge_core::terms::Term;
use upbridge_core::terms::TermKind;
use upbridge_core::terms::TermStore;

use crate::Solver;
use crate::SolverError;

/// Universally quantified assertions and the ground terms they are instantiated with.
#[derive(Clone, Debug, Default)]
pub(crate) struct Quantifiers {
    asserted: Vec<Term>,
    /// Ground constants and numerals of the assertions, by sort, in order of appearance.
    ground: HashMap<Sort, Vec<Term>>,
    bound: HashSet<Term>,
    /// Every binding which has been considered, whether or not it was allowed.
    considered: HashSet<(Term, Vec<Term>)>,
    num_instances: HashMap<Term, usize>,
}

impl Quantifiers {
    /// Records the ground terms and the top-level quantifiers of an assertion.
    pub(crate) fn collect(&mut self, terms: &TermStore, assertion: Term) {
        if matches!(terms.kind(assertion), TermKind::Forall { .. }) {
            self.asserted.push(assertion);
        }

        let mut visited: HashSet<Term> = HashSet::default();
        let mut stack = vec![assertion];
        while let Some(term) = stack.pop() {
            if !visited.insert(term) {
                continue;
            }

            match terms.kind(term) {
                TermKind::Constant { .. } => {
                    if !self.bound.contains(&term) {
                        self.add_ground(term);
                    }
                }
                TermKind::BitVecNumeral { .. } | TermKind::IntNumeral(_) => self.add_ground(term),
                TermKind::True | TermKind::False => {}
                TermKind::Not(inner) => stack.push(*inner),
                TermKind::And(args) | TermKind::Or(args) | TermKind::App { args, .. } => {
                    stack.extend(args.iter().copied())
                }
                TermKind::Implies(lhs, rhs) | TermKind::Eq(lhs, rhs) => {
                    stack.extend([*lhs, *rhs])
                }
                TermKind::Bit { of, .. } => stack.push(*of),
                TermKind::Forall { bound, body } => {
                    self.bound.extend(bound.iter().copied());
                    self.forget_ground(bound);
                    stack.push(*body);
                }
            }
        }
    }

    fn add_ground(&mut self, term: Term) {
        let terms = self.ground.entry(term.sort()).or_default();
        if !terms.contains(&term) {
            terms.push(term);
        }
    }

    /// A constant seen as ground before it turned out to be bound elsewhere.
    fn forget_ground(&mut self, bound: &[Term]) {
        for term in bound {
            if let Some(terms) = self.ground.get_mut(&term.sort()) {
                terms.retain(|ground| ground != term);
            }
        }
    }

    fn candidates(&self, sort: Sort) -> Vec<Term> {
        self.ground.get(&sort).cloned().unwrap_or_default()
    }
}

impl Solver {
    /// Instantiates every quantifier which holds with the ground terms of the assertions; returns
    /// whether any instance was added.
    pub(crate) fn instantiate(&mut self) -> Result<bool, SolverError> {
        let mut added = false;

        for quantifier in self.quantifiers.asserted.clone() {
            let literal = self.literal(quantifier)?;
            if !self.assignments.is_true(literal) {
                continue;
            }
            let TermKind::Forall { bound, body } = self.terms.kind(quantifier).clone() else {
                continue;
            };

            let bindings = bound
                .iter()
                .map(|variable| self.quantifiers.candidates(variable.sort()))
                .multi_cartesian_product()
                .collect::<Vec<_>>();

            for binding in bindings {
                let num_instances = self
                    .quantifiers
                    .num_instances
                    .get(&quantifier)
                    .copied()
                    .unwrap_or(0);
                if num_instances >= self.options.max_instances_per_quantifier {
                    break;
                }
                if !self
                    .quantifiers
                    .considered
                    .insert((quantifier, binding.clone()))
                {
                    continue;
                }

                let substitution = bound
                    .iter()
                    .copied()
                    .zip(binding.iter().copied())
                    .collect::<Vec<_>>();
                let instance = self.terms.substitute(body, &substitution)?;

                if !self.allow_binding(quantifier, instance)? {
                    trace!(
                        "The binding {} of {} is blocked",
                        self.terms.display(instance),
                        self.terms.display(quantifier)
                    );
                    self.statistics.num_blocked_instantiations += 1;
                    continue;
                }

                *self
                    .quantifiers
                    .num_instances
                    .entry(quantifier)
                    .or_default() += 1;
                self.statistics.num_instantiations += 1;

                let instance = self.literal(instance)?;
                self.queue_clause(vec![!literal, instance], ProofHint::Instance);
                added = true;
            }
        }

        Ok(added)
    }
}
