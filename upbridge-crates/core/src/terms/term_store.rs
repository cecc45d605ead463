use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

use super::FuncDecl;
use super::FuncDeclInfo;
use super::Sort;
use super::SortId;
use super::Term;
use super::TermId;
use super::TermKind;
use crate::containers::HashMap;
use crate::containers::KeyedVec;
use crate::BridgeError;

const MAX_BIT_VECTOR_WIDTH: u32 = 64;

/// A hash-consing store of terms, function declarations and uninterpreted sorts.
///
/// Cloning the store preserves every identity, which is how a forked engine context keeps the
/// terms of its parent meaningful.
#[derive(Clone, Debug, Default)]
pub struct TermStore {
    nodes: KeyedVec<TermId, (TermKind, Sort)>,
    shared: HashMap<(TermKind, Sort), TermId>,
    decls: KeyedVec<FuncDecl, FuncDeclInfo>,
    sorts: KeyedVec<SortId, Arc<str>>,
}

impl TermStore {
    fn intern(&mut self, kind: TermKind, sort: Sort) -> Term {
        let key = (kind, sort);
        if let Some(&id) = self.shared.get(&key) {
            return Term::new(id, sort);
        }

        let id = self.nodes.push(key.clone());
        let _ = self.shared.insert(key, id);
        Term::new(id, sort)
    }

    /// Looks up a term without creating it.
    pub fn find(&self, kind: &TermKind, sort: Sort) -> Option<Term> {
        self.shared
            .get(&(kind.clone(), sort))
            .map(|&id| Term::new(id, sort))
    }

    pub fn kind(&self, term: Term) -> &TermKind {
        &self.nodes[term.id()].0
    }

    pub fn num_terms(&self) -> usize {
        self.nodes.len()
    }

    pub fn display(&self, term: Term) -> TermDisplay<'_> {
        TermDisplay { store: self, term }
    }
}

/// Sorts and declarations.
impl TermStore {
    pub fn mk_uninterpreted_sort(&mut self, name: &str) -> Sort {
        Sort::Uninterpreted(self.sorts.push(Arc::from(name)))
    }

    pub fn declare_function(
        &mut self,
        name: &str,
        domain: &[Sort],
        range: Sort,
    ) -> Result<FuncDecl, BridgeError> {
        self.declare(name, domain, range, false)
    }

    /// Declares a function whose applications are announced to the attached user propagator.
    pub fn declare_propagated_function(
        &mut self,
        name: &str,
        domain: &[Sort],
        range: Sort,
    ) -> Result<FuncDecl, BridgeError> {
        self.declare(name, domain, range, true)
    }

    fn declare(
        &mut self,
        name: &str,
        domain: &[Sort],
        range: Sort,
        propagated: bool,
    ) -> Result<FuncDecl, BridgeError> {
        for &sort in domain.iter().chain(std::iter::once(&range)) {
            check_sort(sort)?;
        }

        Ok(self.decls.push(FuncDeclInfo {
            name: Arc::from(name),
            domain: domain.to_vec(),
            range,
            propagated,
        }))
    }

    pub fn decl_info(&self, decl: FuncDecl) -> &FuncDeclInfo {
        &self.decls[decl]
    }

    /// Whether `term` applies a function declared with
    /// [`TermStore::declare_propagated_function`].
    pub fn is_propagated_app(&self, term: Term) -> bool {
        match self.kind(term) {
            TermKind::App { decl, .. } => self.decls[*decl].propagated,
            _ => false,
        }
    }
}

/// Constants and numerals.
impl TermStore {
    pub fn mk_true(&mut self) -> Term {
        self.intern(TermKind::True, Sort::Bool)
    }

    pub fn mk_false(&mut self) -> Term {
        self.intern(TermKind::False, Sort::Bool)
    }

    pub fn mk_bool(&mut self, value: bool) -> Term {
        if value {
            self.mk_true()
        } else {
            self.mk_false()
        }
    }

    pub fn mk_const(&mut self, name: &str, sort: Sort) -> Result<Term, BridgeError> {
        check_sort(sort)?;
        Ok(self.intern(
            TermKind::Constant {
                name: Arc::from(name),
            },
            sort,
        ))
    }

    pub fn mk_bool_const(&mut self, name: &str) -> Term {
        self.intern(
            TermKind::Constant {
                name: Arc::from(name),
            },
            Sort::Bool,
        )
    }

    pub fn mk_bv_const(&mut self, name: &str, width: u32) -> Result<Term, BridgeError> {
        self.mk_const(name, Sort::BitVec(width))
    }

    pub fn mk_int_const(&mut self, name: &str) -> Term {
        self.intern(
            TermKind::Constant {
                name: Arc::from(name),
            },
            Sort::Int,
        )
    }

    /// Creates the numeral `value` of the given width; bits above the width are discarded.
    pub fn mk_bv_numeral(&mut self, value: u64, width: u32) -> Result<Term, BridgeError> {
        check_sort(Sort::BitVec(width))?;
        let value = if width == MAX_BIT_VECTOR_WIDTH {
            value
        } else {
            value & ((1_u64 << width) - 1)
        };
        Ok(self.intern(
            TermKind::BitVecNumeral { value, width },
            Sort::BitVec(width),
        ))
    }

    pub fn mk_int(&mut self, value: i64) -> Term {
        self.intern(TermKind::IntNumeral(value), Sort::Int)
    }

    pub fn bool_value(&self, term: Term) -> Option<bool> {
        match self.kind(term) {
            TermKind::True => Some(true),
            TermKind::False => Some(false),
            _ => None,
        }
    }

    pub fn bv_value(&self, term: Term) -> Option<u64> {
        match self.kind(term) {
            TermKind::BitVecNumeral { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Compound terms.
impl TermStore {
    pub fn mk_not(&mut self, term: Term) -> Result<Term, BridgeError> {
        expect_bool(term)?;
        Ok(self.intern(TermKind::Not(term), Sort::Bool))
    }

    pub fn mk_and(&mut self, terms: &[Term]) -> Result<Term, BridgeError> {
        terms.iter().try_for_each(|&term| expect_bool(term))?;
        Ok(self.intern(TermKind::And(terms.to_vec()), Sort::Bool))
    }

    pub fn mk_or(&mut self, terms: &[Term]) -> Result<Term, BridgeError> {
        terms.iter().try_for_each(|&term| expect_bool(term))?;
        Ok(self.intern(TermKind::Or(terms.to_vec()), Sort::Bool))
    }

    pub fn mk_implies(&mut self, premise: Term, conclusion: Term) -> Result<Term, BridgeError> {
        expect_bool(premise)?;
        expect_bool(conclusion)?;
        Ok(self.intern(TermKind::Implies(premise, conclusion), Sort::Bool))
    }

    pub fn mk_eq(&mut self, lhs: Term, rhs: Term) -> Result<Term, BridgeError> {
        if lhs.sort() != rhs.sort() {
            return Err(BridgeError::InvalidArgument(format!(
                "cannot equate a term of sort {} with a term of sort {}",
                lhs.sort(),
                rhs.sort()
            )));
        }
        Ok(self.intern(TermKind::Eq(lhs, rhs), Sort::Bool))
    }

    pub fn mk_bit(&mut self, of: Term, index: u32) -> Result<Term, BridgeError> {
        match of.sort() {
            Sort::BitVec(width) if index < width => {
                Ok(self.intern(TermKind::Bit { of, index }, Sort::Bool))
            }
            sort => Err(BridgeError::InvalidArgument(format!(
                "bit {index} does not exist in a term of sort {sort}"
            ))),
        }
    }

    pub fn mk_app(&mut self, decl: FuncDecl, args: &[Term]) -> Result<Term, BridgeError> {
        let info = &self.decls[decl];
        if info.domain.len() != args.len()
            || info
                .domain
                .iter()
                .zip(args)
                .any(|(&sort, arg)| sort != arg.sort())
        {
            return Err(BridgeError::InvalidArgument(format!(
                "arguments do not match the domain of '{}'",
                info.name
            )));
        }

        let range = info.range;
        Ok(self.intern(
            TermKind::App {
                decl,
                args: args.to_vec(),
            },
            range,
        ))
    }

    /// Quantifies `body` universally over the constants in `bound`.
    pub fn mk_forall(&mut self, bound: &[Term], body: Term) -> Result<Term, BridgeError> {
        expect_bool(body)?;
        if let Some(&not_a_constant) = bound
            .iter()
            .find(|&&term| !matches!(self.kind(term), TermKind::Constant { .. }))
        {
            return Err(BridgeError::InvalidArgument(format!(
                "only constants can be bound, not {}",
                self.display(not_a_constant)
            )));
        }

        Ok(self.intern(
            TermKind::Forall {
                bound: bound.to_vec(),
                body,
            },
            Sort::Bool,
        ))
    }

    /// Replaces every free occurrence of the first term of each pair by the second.
    pub fn substitute(
        &mut self,
        term: Term,
        substitution: &[(Term, Term)],
    ) -> Result<Term, BridgeError> {
        if let Some(&(_, replacement)) = substitution.iter().find(|(from, _)| *from == term) {
            return Ok(replacement);
        }

        let kind = self.kind(term).clone();
        match kind {
            TermKind::True
            | TermKind::False
            | TermKind::BitVecNumeral { .. }
            | TermKind::IntNumeral(_)
            | TermKind::Constant { .. } => Ok(term),
            TermKind::Not(inner) => {
                let inner = self.substitute(inner, substitution)?;
                self.mk_not(inner)
            }
            TermKind::And(args) => {
                let args = self.substitute_all(&args, substitution)?;
                self.mk_and(&args)
            }
            TermKind::Or(args) => {
                let args = self.substitute_all(&args, substitution)?;
                self.mk_or(&args)
            }
            TermKind::Implies(premise, conclusion) => {
                let premise = self.substitute(premise, substitution)?;
                let conclusion = self.substitute(conclusion, substitution)?;
                self.mk_implies(premise, conclusion)
            }
            TermKind::Eq(lhs, rhs) => {
                let lhs = self.substitute(lhs, substitution)?;
                let rhs = self.substitute(rhs, substitution)?;
                self.mk_eq(lhs, rhs)
            }
            TermKind::Bit { of, index } => {
                let of = self.substitute(of, substitution)?;
                self.mk_bit(of, index)
            }
            TermKind::App { decl, args } => {
                let args = self.substitute_all(&args, substitution)?;
                self.mk_app(decl, &args)
            }
            TermKind::Forall { bound, body } => {
                // Bound constants shadow the substitution.
                let inner = substitution
                    .iter()
                    .filter(|(from, _)| !bound.contains(from))
                    .copied()
                    .collect::<Vec<_>>();
                let body = self.substitute(body, &inner)?;
                self.mk_forall(&bound, body)
            }
        }
    }

    fn substitute_all(
        &mut self,
        terms: &[Term],
        substitution: &[(Term, Term)],
    ) -> Result<Vec<Term>, BridgeError> {
        terms
            .iter()
            .map(|&term| self.substitute(term, substitution))
            .collect()
    }
}

fn check_sort(sort: Sort) -> Result<(), BridgeError> {
    match sort {
        Sort::BitVec(width) if width == 0 || width > MAX_BIT_VECTOR_WIDTH => {
            Err(BridgeError::InvalidArgument(format!(
                "bit-vector widths range from 1 to {MAX_BIT_VECTOR_WIDTH}, not {width}"
            )))
        }
        _ => Ok(()),
    }
}

fn expect_bool(term: Term) -> Result<(), BridgeError> {
    if term.sort() == Sort::Bool {
        Ok(())
    } else {
        Err(BridgeError::InvalidArgument(format!(
            "expected a Boolean term, got a term of sort {}",
            term.sort()
        )))
    }
}

/// Prints a term in an SMT-LIB like syntax.
#[derive(Clone, Copy, Debug)]
pub struct TermDisplay<'a> {
    store: &'a TermStore,
    term: Term,
}

impl TermDisplay<'_> {
    fn child(&self, term: Term) -> Self {
        TermDisplay {
            store: self.store,
            term,
        }
    }

    fn write_application(
        &self,
        f: &mut Formatter<'_>,
        head: &str,
        args: &[Term],
    ) -> std::fmt::Result {
        write!(f, "({head}")?;
        for &arg in args {
            write!(f, " {}", self.child(arg))?;
        }
        f.write_str(")")
    }
}

impl Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.store.kind(self.term) {
            TermKind::True => f.write_str("true"),
            TermKind::False => f.write_str("false"),
            TermKind::BitVecNumeral { value, width } => write!(f, "(_ bv{value} {width})"),
            TermKind::IntNumeral(value) if *value < 0 => write!(f, "(- {})", value.unsigned_abs()),
            TermKind::IntNumeral(value) => write!(f, "{value}"),
            TermKind::Constant { name } => f.write_str(name),
            TermKind::Not(inner) => self.write_application(f, "not", &[*inner]),
            TermKind::And(args) => self.write_application(f, "and", args),
            TermKind::Or(args) => self.write_application(f, "or", args),
            TermKind::Implies(premise, conclusion) => {
                self.write_application(f, "=>", &[*premise, *conclusion])
            }
            TermKind::Eq(lhs, rhs) => self.write_application(f, "=", &[*lhs, *rhs]),
            TermKind::Bit { of, index } => {
                write!(f, "((_ bit {index}) {})", self.child(*of))
            }
            TermKind::App { decl, args } => {
                let name = &self.store.decl_info(*decl).name;
                if args.is_empty() {
                    f.write_str(name)
                } else {
                    self.write_application(f, name, args)
                }
            }
            TermKind::Forall { bound, body } => {
                f.write_str("(forall (")?;
                for (position, &variable) in bound.iter().enumerate() {
                    if position > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "({} {})", self.child(variable), variable.sort())?;
                }
                write!(f, ") {})", self.child(*body))
            }
        }
    }
}
