//! Translation of terms into literals and clauses.
//!
//! Boolean structure is encoded with one variable per distinct term; bit-vector terms are
//! encoded with one variable per bit. Terms of other sorts, uninterpreted applications and
//! quantified formulas are opaque: they receive a variable but no further definition.
use log::trace;
use upbridge_core::containers::HashMap;
use upbridge_core::containers::HashSet;
use upbridge_core::containers::KeyedVec;
use upbridge_core::observer::ProofHint;
use upbridge_core::terms::Sort;
use upbridge_core::terms::Term;
use upbridge_core::terms::TermKind;

use crate::sat::Literal;
use crate::sat::Variable;
use crate::Solver;
use crate::SolverError;

#[derive(Clone, Debug)]
pub(crate) struct Encoding {
    literals: HashMap<Term, Literal>,
    bits: HashMap<Term, Vec<Literal>>,
    /// The term every variable stands for; negative literals stand for its negation.
    variable_terms: KeyedVec<Variable, Term>,
    /// The sides of the equality which every equality variable stands for.
    equalities: HashMap<Variable, (Term, Term)>,
    /// Applications of propagated functions which have been internalised.
    announced: HashSet<Term>,
    pub(crate) pending_created: Vec<Term>,
    true_literal: Literal,
}

impl Encoding {
    pub(crate) fn new(true_variable: Variable, true_term: Term) -> Encoding {
        let mut variable_terms = KeyedVec::default();
        let _ = variable_terms.push(true_term);
        let true_literal = Literal::new(true_variable, true);

        Encoding {
            literals: HashMap::from_iter([(true_term, true_literal)]),
            bits: HashMap::default(),
            variable_terms,
            equalities: HashMap::default(),
            announced: HashSet::default(),
            pending_created: Vec::new(),
            true_literal,
        }
    }

    pub(crate) fn true_literal(&self) -> Literal {
        self.true_literal
    }

    pub(crate) fn cached_literal(&self, term: Term) -> Option<Literal> {
        self.literals.get(&term).copied()
    }

    pub(crate) fn cached_bits(&self, term: Term) -> Option<&[Literal]> {
        self.bits.get(&term).map(Vec::as_slice)
    }

    pub(crate) fn equality(&self, variable: Variable) -> Option<(Term, Term)> {
        self.equalities.get(&variable).copied()
    }
}

impl Solver {
    fn new_variable(&mut self, term: Term) -> Variable {
        let variable = self.assignments.new_variable();
        self.clauses.grow_to(self.assignments.num_variables());
        let _ = self.encoding.variable_terms.push(term);
        self.decision_order.push(variable);
        variable
    }

    fn fresh_literal(&mut self, term: Term) -> Literal {
        Literal::new(self.new_variable(term), true)
    }

    fn unsupported(&self, term: Term) -> SolverError {
        SolverError::UnsupportedTerm(self.terms.display(term).to_string())
    }

    /// The term which `literal` stands for.
    pub(crate) fn term_of(&mut self, literal: Literal) -> Result<Term, SolverError> {
        let term = self.encoding.variable_terms[literal.variable()];
        if literal.is_positive() {
            Ok(term)
        } else {
            Ok(self.terms.mk_not(term)?)
        }
    }

    /// The literal of a Boolean term, encoding it first when needed.
    pub(crate) fn literal(&mut self, term: Term) -> Result<Literal, SolverError> {
        if term.sort() != Sort::Bool {
            return Err(self.unsupported(term));
        }
        if let Some(literal) = self.encoding.cached_literal(term) {
            return Ok(literal);
        }

        let literal = self.encode_bool(term)?;
        let _ = self.encoding.literals.insert(term, literal);
        Ok(literal)
    }

    /// The literals of the bits of a bit-vector term, least significant first.
    pub(crate) fn bits(&mut self, term: Term) -> Result<Vec<Literal>, SolverError> {
        let Sort::BitVec(width) = term.sort() else {
            return Err(self.unsupported(term));
        };
        if let Some(bits) = self.encoding.cached_bits(term) {
            return Ok(bits.to_vec());
        }

        let kind = self.terms.kind(term).clone();
        let bits = match kind {
            TermKind::BitVecNumeral { value, .. } => (0..width)
                .map(|index| {
                    let literal = self.encoding.true_literal;
                    if (value >> index) & 1 == 1 {
                        literal
                    } else {
                        !literal
                    }
                })
                .collect(),
            TermKind::Constant { .. } => self.fresh_bits(term, width)?,
            TermKind::App { args, .. } => {
                self.internalise_all(&args)?;
                self.announce(term);
                self.fresh_bits(term, width)?
            }
            _ => return Err(self.unsupported(term)),
        };

        let _ = self.encoding.bits.insert(term, bits.clone());
        Ok(bits)
    }

    /// The literals which fix `term`: its own literal for a Boolean, its bits for a bit-vector.
    pub(crate) fn term_bits(&mut self, term: Term) -> Result<Vec<Literal>, SolverError> {
        match term.sort() {
            Sort::Bool => Ok(vec![self.literal(term)?]),
            _ => self.bits(term),
        }
    }

    fn fresh_bits(&mut self, term: Term, width: u32) -> Result<Vec<Literal>, SolverError> {
        (0..width)
            .map(|index| -> Result<Literal, SolverError> {
                let bit = self.terms.mk_bit(term, index)?;
                let literal = self.fresh_literal(bit);
                let _ = self.encoding.literals.insert(bit, literal);
                Ok(literal)
            })
            .collect()
    }

    /// Makes sure the engine knows about `term`, whatever its sort.
    pub(crate) fn internalise(&mut self, term: Term) -> Result<(), SolverError> {
        match term.sort() {
            Sort::Bool => {
                let _ = self.literal(term)?;
            }
            Sort::BitVec(_) => {
                let _ = self.bits(term)?;
            }
            _ => {
                if let TermKind::App { args, .. } = self.terms.kind(term).clone() {
                    self.internalise_all(&args)?;
                    self.announce(term);
                }
            }
        }
        Ok(())
    }

    fn internalise_all(&mut self, terms: &[Term]) -> Result<(), SolverError> {
        terms.iter().try_for_each(|&term| self.internalise(term))
    }

    fn announce(&mut self, term: Term) {
        if self.terms.is_propagated_app(term) && self.encoding.announced.insert(term) {
            trace!("Internalised {}", self.terms.display(term));
            self.encoding.pending_created.push(term);
        }
    }

    fn encode_bool(&mut self, term: Term) -> Result<Literal, SolverError> {
        let kind = self.terms.kind(term).clone();
        match kind {
            TermKind::True => Ok(self.encoding.true_literal),
            TermKind::False => Ok(!self.encoding.true_literal),
            TermKind::Not(inner) => Ok(!self.literal(inner)?),
            TermKind::Constant { .. } | TermKind::Forall { .. } => Ok(self.fresh_literal(term)),
            TermKind::App { args, .. } => {
                self.internalise_all(&args)?;
                self.announce(term);
                Ok(self.fresh_literal(term))
            }
            TermKind::And(args) => {
                let literals = self.literals(&args)?;
                Ok(self.define_and(term, literals))
            }
            TermKind::Or(args) => {
                let literals = self.literals(&args)?;
                Ok(self.define_or(term, literals))
            }
            TermKind::Implies(premise, conclusion) => {
                let premise = self.literal(premise)?;
                let conclusion = self.literal(conclusion)?;
                Ok(self.define_or(term, vec![!premise, conclusion]))
            }
            TermKind::Eq(lhs, rhs) => self.encode_equality(term, lhs, rhs),
            TermKind::Bit { of, index } => Ok(self.bits(of)?[index as usize]),
            TermKind::BitVecNumeral { .. } | TermKind::IntNumeral(_) => {
                Err(self.unsupported(term))
            }
        }
    }

    fn literals(&mut self, terms: &[Term]) -> Result<Vec<Literal>, SolverError> {
        terms.iter().map(|&term| self.literal(term)).collect()
    }

    fn define_and(&mut self, term: Term, conjuncts: Vec<Literal>) -> Literal {
        let literal = self.fresh_literal(term);
        for &conjunct in &conjuncts {
            self.queue_clause(vec![!literal, conjunct], ProofHint::Definition);
        }
        let mut clause = vec![literal];
        clause.extend(conjuncts.into_iter().map(|conjunct| !conjunct));
        self.queue_clause(clause, ProofHint::Definition);
        literal
    }

    fn define_or(&mut self, term: Term, disjuncts: Vec<Literal>) -> Literal {
        let literal = self.fresh_literal(term);
        for &disjunct in &disjuncts {
            self.queue_clause(vec![literal, !disjunct], ProofHint::Definition);
        }
        let mut clause = vec![!literal];
        clause.extend(disjuncts);
        self.queue_clause(clause, ProofHint::Definition);
        literal
    }

    fn encode_equality(
        &mut self,
        term: Term,
        lhs: Term,
        rhs: Term,
    ) -> Result<Literal, SolverError> {
        if lhs == rhs {
            return Ok(self.encoding.true_literal);
        }

        match (self.terms.kind(lhs), self.terms.kind(rhs)) {
            (TermKind::BitVecNumeral { .. }, TermKind::BitVecNumeral { .. })
            | (TermKind::IntNumeral(_), TermKind::IntNumeral(_)) => {
                // Shared numerals are equal exactly when they are the same term.
                return Ok(!self.encoding.true_literal);
            }
            _ => {}
        }

        let literal = match lhs.sort() {
            Sort::Bool => {
                let a = self.literal(lhs)?;
                let b = self.literal(rhs)?;
                let literal = self.fresh_literal(term);
                self.queue_clause(vec![!literal, !a, b], ProofHint::Definition);
                self.queue_clause(vec![!literal, a, !b], ProofHint::Definition);
                self.queue_clause(vec![literal, a, b], ProofHint::Definition);
                self.queue_clause(vec![literal, !a, !b], ProofHint::Definition);
                literal
            }
            Sort::BitVec(width) => {
                let bit_equalities = (0..width)
                    .map(|index| -> Result<Literal, SolverError> {
                        let lhs_bit = self.terms.mk_bit(lhs, index)?;
                        let rhs_bit = self.terms.mk_bit(rhs, index)?;
                        let equality = self.terms.mk_eq(lhs_bit, rhs_bit)?;
                        self.literal(equality)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.define_and(term, bit_equalities)
            }
            _ => {
                self.internalise(lhs)?;
                self.internalise(rhs)?;
                self.fresh_literal(term)
            }
        };

        let _ = self
            .encoding
            .equalities
            .insert(literal.variable(), (lhs, rhs));
        Ok(literal)
    }

    /// The value of a Boolean or bit-vector term under the current assignment, as a term.
    pub(crate) fn value_term(&mut self, term: Term) -> Result<Option<Term>, SolverError> {
        let bits = self.term_bits(term)?;
        let Some(values) = bits
            .iter()
            .map(|&literal| self.assignments.literal_value(literal))
            .collect::<Option<Vec<_>>>()
        else {
            return Ok(None);
        };

        match term.sort() {
            Sort::Bool => Ok(Some(self.terms.mk_bool(values[0]))),
            Sort::BitVec(width) => {
                let value = values
                    .iter()
                    .rev()
                    .fold(0_u64, |value, &bit| (value << 1) | bit as u64);
                Ok(Some(self.terms.mk_bv_numeral(value, width)?))
            }
            _ => Err(self.unsupported(term)),
        }
    }
}

#[cfg(test)]
mod tests {
    use upbridge_core::terms::TermKind;

    use crate::Solver;

    #[test]
    fn structurally_equal_terms_share_a_literal() {
        let mut solver = Solver::default();
        let x = solver.terms().mk_bool_const("x");
        let y = solver.terms().mk_bool_const("y");
        let first = solver.terms().mk_or(&[x, y]).expect("Boolean arguments");
        let second = solver.terms().mk_or(&[x, y]).expect("Boolean arguments");

        let first = solver.literal(first).expect("encodable");
        let second = solver.literal(second).expect("encodable");

        assert_eq!(first, second);
    }

    #[test]
    fn bits_of_a_numeral_are_constant() {
        let mut solver = Solver::default();
        let five = solver.terms().mk_bv_numeral(5, 4).expect("valid width");

        let bits = solver.bits(five).expect("encodable");
        let true_literal = solver.encoding.true_literal();

        assert_eq!(vec![true_literal, !true_literal, true_literal, !true_literal], bits);
    }

    #[test]
    fn every_bit_of_a_constant_is_named() {
        let mut solver = Solver::default();
        let x = solver.terms().mk_bv_const("x", 2).expect("valid width");

        let bits = solver.bits(x).expect("encodable");
        let term = solver.term_of(bits[1]).expect("known variable");

        assert_eq!(&TermKind::Bit { of: x, index: 1 }, solver.terms().kind(term));
    }

    #[test]
    fn integer_terms_cannot_be_bit_blasted() {
        let mut solver = Solver::default();
        let x = solver.terms().mk_int_const("x");

        assert!(solver.bits(x).is_err());
    }
}
