//! # Pattern Matching Module
//!
//! Decides whether a subject expression can be produced by substituting
//! concrete subexpressions for a pattern's free variables, and records those
//! substitutions in a [`MatchContext`].
//!
//! ## Matching rules per node kind
//!
//! - **Constants** match only structurally/numerically identical subjects.
//! - **Variables** match any subject and record the binding; a variable
//!   already bound to a *different* subject fails (first-binding-wins,
//!   checked by equality).
//! - **Calls** match calls with the same name and arity, argument-wise.
//! - **Powers** try a handful of algebraic shapes: the bound-exponent root
//!   shortcut, `x^0 = 1`, `0^x = 0`, the structural base/exponent match, the
//!   exponent-matches-1 fallback and the root fallback.
//! - **Sums/Products** run the associative-commutative search: constant
//!   pattern terms are moved to the subject side first, then every way of
//!   assigning pattern terms to combinations of subject terms is tried,
//!   backtracking through the context checkpoint mechanism.
//!
//! Match failure is an expected, frequent outcome - a `false`/`None` result,
//! never an error.

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{all_except, split_by_indices};
use itertools::Itertools;
use log::trace;
use std::collections::HashMap;

/// Store matched variables with the ability to revert to a previous match
/// state upon matching failure.
///
/// Bindings live in a plain hash map; an append-only insertion history makes
/// checkpoint/rollback cheap without snapshotting the whole map.
#[derive(Debug, Default)]
pub struct MatchContext {
    bindings: HashMap<String, Expr>,
    history: Vec<String>,
}

impl MatchContext {
    pub fn new() -> MatchContext {
        MatchContext::default()
    }

    /// The expression `name` is bound to, if any.
    pub fn matched(&self, name: &str) -> Option<&Expr> {
        self.bindings.get(name)
    }

    /// Check if `name` has already been bound to `value`. If not, store the
    /// binding.
    ///
    /// # Returns
    /// false if `name` was already bound to an expression other than
    /// `value`, true otherwise.
    pub fn bind(&mut self, name: &str, value: &Expr) -> bool {
        if let Some(bound) = self.bindings.get(name) {
            return bound == value;
        }
        self.bindings.insert(name.to_string(), value.clone());
        self.history.push(name.to_string());
        true
    }

    /// Remember the current state and attempt `f`. If `f` returns false,
    /// every binding added since the checkpoint is removed in reverse order.
    pub fn try_match(&mut self, f: impl FnOnce(&mut MatchContext) -> bool) -> bool {
        let checkpoint = self.history.len();
        if f(self) {
            return true;
        }
        while self.history.len() > checkpoint {
            if let Some(name) = self.history.pop() {
                self.bindings.remove(&name);
            }
        }
        false
    }

    pub fn bindings(&self) -> &HashMap<String, Expr> {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The bindings as a substitution map suitable for
    /// [`Expr::substitute`].
    pub fn substitution(&self) -> HashMap<Expr, Expr> {
        self.bindings
            .iter()
            .map(|(name, value)| (Expr::var(name), value.clone()))
            .collect()
    }
}

// The two associative-commutative operators share one matching algorithm,
// parameterized on the identity element and the inverse operation.
#[derive(Clone, Copy)]
enum AcOp {
    Sum,
    Product,
}

impl AcOp {
    fn combine(self, terms: Vec<Expr>) -> Expr {
        match self {
            AcOp::Sum => Expr::sum(terms),
            AcOp::Product => Expr::product(terms),
        }
    }

    fn identity(self) -> Expr {
        match self {
            AcOp::Sum => Expr::zero(),
            AcOp::Product => Expr::one(),
        }
    }

    fn terms_of(self, e: &Expr) -> &[Expr] {
        match self {
            AcOp::Sum => e.sum_terms(),
            AcOp::Product => e.product_terms(),
        }
    }

    // Remove `removed` from `subject`: subtract for sums, divide for
    // products.
    fn remove(self, subject: &Expr, removed: &Expr) -> Expr {
        match self {
            AcOp::Sum => (subject.clone() - removed.clone()).evaluate(),
            AcOp::Product => (subject.clone() / removed.clone()).evaluate(),
        }
    }
}

impl Expr {
    /// Try matching this pattern against `subject` such that on success,
    /// substituting the returned context into the pattern yields an
    /// expression equal to `subject`.
    pub fn matches(&self, subject: &Expr) -> Option<MatchContext> {
        let mut ctx = MatchContext::new();
        if self.matches_in(subject, &mut ctx) {
            Some(ctx)
        } else {
            None
        }
    }

    /// Matching step against an existing context (bindings made by earlier
    /// steps constrain this one).
    pub fn matches_in(&self, subject: &Expr, ctx: &mut MatchContext) -> bool {
        match self {
            Expr::Var(name) => ctx.bind(name, subject),
            Expr::Const(_) => self == subject,
            Expr::Call(name, args) => match_call(name, args, subject, ctx),
            Expr::Sum(terms) => match_ac(AcOp::Sum, terms, subject, ctx),
            Expr::Product(terms) => match_ac(AcOp::Product, terms, subject, ctx),
            Expr::Pow(base, exp) => match_power(base, exp, subject, ctx),
        }
    }
}

fn match_call(name: &str, args: &[Expr], subject: &Expr, ctx: &mut MatchContext) -> bool {
    if let Expr::Call(subject_name, subject_args) = subject {
        if name != subject_name || args.len() != subject_args.len() {
            return false;
        }
        return ctx.try_match(|ctx| {
            args.iter()
                .zip(subject_args.iter())
                .all(|(p, e)| p.matches_in(e, ctx))
        });
    }
    false
}

fn match_power(base: &Expr, exp: &Expr, subject: &Expr, ctx: &mut MatchContext) -> bool {
    // An already-bound exponent lets the base match the corresponding root.
    if let Expr::Var(name) = exp {
        if let Some(bound) = ctx.matched(name).cloned() {
            let root = subject.clone().pow(Expr::one() / bound).evaluate();
            if base.matches_in(&root, ctx) {
                return true;
            }
        }
    }

    // x^0 = 1.
    if subject.is_one() && exp.matches_in(&Expr::zero(), ctx) {
        return true;
    }
    // 0^x = 0.
    if subject.is_zero() && base.matches_in(&Expr::zero(), ctx) {
        return true;
    }

    if let Expr::Pow(subject_base, subject_exp) = subject {
        if ctx.try_match(|ctx| {
            base.matches_in(subject_base, ctx) && exp.matches_in(subject_exp, ctx)
        }) {
            return true;
        }
    }

    // If the exponent matches 1, the subject can match the base directly.
    if ctx.try_match(|ctx| exp.matches_in(&Expr::one(), ctx) && base.matches_in(subject, ctx)) {
        return true;
    }

    // Root fallback: base against subject^(1/exponent).
    let root = subject.clone().pow(Expr::one() / exp.clone()).evaluate();
    base.matches_in(&root, ctx)
}

fn match_ac(op: AcOp, pattern_terms: &[Expr], subject: &Expr, ctx: &mut MatchContext) -> bool {
    // A zero subject lets any factor of a product pattern match to zero.
    if matches!(op, AcOp::Product) && subject.is_zero() {
        return pattern_terms
            .iter()
            .any(|p| p.matches_in(&Expr::zero(), ctx));
    }

    // Move the purely-constant pattern terms over to the subject side,
    // reducing the search to non-constant terms only.
    let constants: Vec<Expr> = pattern_terms
        .iter()
        .filter(|t| matches!(t, Expr::Const(_)))
        .cloned()
        .collect();
    let (subject, pterms): (Expr, Vec<Expr>) = if constants.is_empty() {
        (subject.clone(), pattern_terms.to_vec())
    } else {
        (
            op.remove(subject, &op.combine(constants)),
            pattern_terms
                .iter()
                .filter(|t| !matches!(t, Expr::Const(_)))
                .cloned()
                .collect(),
        )
    };

    let subject_terms: Vec<Expr> = op.terms_of(&subject).to_vec();
    trace!(
        "AC match: {} pattern terms against {} subject terms",
        pterms.len(),
        subject_terms.len()
    );

    // Try starting the match at each term of the pattern.
    for (pi, p) in pterms.iter().enumerate() {
        // Remaining terms of the pattern.
        let rest_pattern = op.combine(all_except(&pterms, pi));

        if let Expr::Var(name) = p {
            if let Some(bound) = ctx.matched(name).cloned() {
                // p already matched: remove it from the subject and match
                // the remainder of the pattern.
                if rest_pattern.matches_in(&op.remove(&subject, &bound), ctx) {
                    return true;
                }
            } else {
                // A variable may stand for more than one subject term: try
                // every combination of the subject terms.
                for size in 1..=subject_terms.len() {
                    for combo in (0..subject_terms.len()).combinations(size) {
                        let (chosen, remaining) = split_by_indices(&subject_terms, &combo);
                        if ctx.try_match(|ctx| {
                            p.matches_in(&op.combine(chosen.clone()), ctx)
                                && rest_pattern.matches_in(&op.combine(remaining.clone()), ctx)
                        }) {
                            return true;
                        }
                    }
                }

                // The pattern term may also be present zero times: bind it
                // to the identity element.
                if ctx.try_match(|ctx| {
                    p.matches_in(&op.identity(), ctx) && rest_pattern.matches_in(&subject, ctx)
                }) {
                    return true;
                }
            }
        } else {
            // A non-variable pattern term matches individual subject terms.
            for (ei, e) in subject_terms.iter().enumerate() {
                if ctx.try_match(|ctx| {
                    p.matches_in(e, ctx)
                        && rest_pattern
                            .matches_in(&op.combine(all_except(&subject_terms, ei)), ctx)
                }) {
                    return true;
                }
            }
        }
    }

    false
}
