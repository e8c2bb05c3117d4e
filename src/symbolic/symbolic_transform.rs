//! # Transform Module
//!
//! Rule-based rewriting on top of the pattern matcher.
//!
//! - [`PatternTransform`] - one rewrite rule: a pattern, a result and a list
//!   of precondition expressions checked under the match bindings.
//! - [`TransformSet`] - a shallow discrimination tree of rules keyed by the
//!   pattern's outermost operator shape, pruning rules whose head cannot
//!   match a subject.
//! - [`AlgebraTransform`] - mechanically derives the whole family of
//!   algebraic rearrangements of one validated equality by moving additive
//!   terms and multiplicative factors across it.
//! - [`CachedTransform`] - memoizes subject -> rewritten subject around a
//!   referentially pure transform.
//!
//! A transform that does not apply returns the subject unchanged; callers
//! detect "no rewrite" by comparing the result against the input.

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::all_except;
use log::{debug, trace};
use std::cell::RefCell;
use std::collections::HashMap;

/// A rewriting operation on expressions.
pub trait Transform {
    /// Rewrite `x`, or return it unchanged if the transform does not apply.
    fn transform(&self, x: &Expr) -> Expr;
}

//___________________________________PATTERN TRANSFORM____________________________________

/// A rewrite rule: pattern expression, result expression and precondition
/// expressions.
#[derive(Debug, Clone)]
pub struct PatternTransform {
    pattern: Expr,
    result: Expr,
    conditions: Vec<Expr>,
}

impl PatternTransform {
    pub fn new(pattern: Expr, result: Expr, conditions: Vec<Expr>) -> PatternTransform {
        PatternTransform {
            pattern,
            result,
            conditions,
        }
    }

    pub fn pattern(&self) -> &Expr {
        &self.pattern
    }
}

impl Transform for PatternTransform {
    /// Match the pattern against `x`; if it matches and every precondition
    /// evaluates true under the bindings, substitute the bindings into the
    /// result and evaluate it.
    fn transform(&self, x: &Expr) -> Expr {
        if let Some(ctx) = self.pattern.matches(x) {
            let bindings = ctx.substitution();
            if self
                .conditions
                .iter()
                .all(|c| c.substitute(&bindings).evaluate().is_true())
            {
                trace!("rewrite {} -> {}", self.pattern, self.result);
                return self.result.substitute(&bindings).evaluate();
            }
        }
        x.clone()
    }
}

//___________________________________TRANSFORM SET____________________________________

fn child_pattern(unique: &mut u32) -> Expr {
    *unique += 1;
    Expr::Var(format!("_{}", unique))
}

// The shape of a pattern: its outermost operator with fresh placeholder
// children. Atoms do not split.
fn split(pattern: &Expr) -> Option<Expr> {
    let mut child = 0u32;
    match pattern {
        Expr::Sum(terms) => Some(Expr::sum(
            terms.iter().map(|_| child_pattern(&mut child)).collect(),
        )),
        Expr::Product(terms) => Some(Expr::product(
            terms.iter().map(|_| child_pattern(&mut child)).collect(),
        )),
        Expr::Pow(_, _) => {
            Some(child_pattern(&mut child).pow(child_pattern(&mut child)))
        }
        Expr::Call(name, args) => Some(Expr::Call(
            name.clone(),
            args.iter().map(|_| child_pattern(&mut child)).collect(),
        )),
        _ => None,
    }
}

/// A set of pattern transforms organized as a shallow tree keyed by pattern
/// head shape. Children are built lazily during rule registration and are
/// tried before this node's own rules (most specific first).
#[derive(Debug, Default)]
pub struct TransformSet {
    pattern: Option<Expr>,
    children: Vec<TransformSet>,
    transforms: Vec<PatternTransform>,
}

impl TransformSet {
    pub fn new() -> TransformSet {
        TransformSet::default()
    }

    fn with_pattern(pattern: Expr, transform: PatternTransform) -> TransformSet {
        let mut set = TransformSet {
            pattern: Some(pattern),
            children: Vec::new(),
            transforms: Vec::new(),
        };
        set.add(transform);
        set
    }

    fn is_child(&self, pattern: &Expr) -> bool {
        match &self.pattern {
            None => true,
            Some(shape) => shape.matches(pattern).is_some(),
        }
    }

    /// Add a transform to the set, descending into the child node whose
    /// shape the pattern matches, creating one lazily if the pattern's shape
    /// can be split.
    pub fn add(&mut self, transform: PatternTransform) {
        for child in self.children.iter_mut() {
            if child.is_child(transform.pattern()) {
                child.add(transform);
                return;
            }
        }

        if let Some(shape) = split(transform.pattern()) {
            if Some(&shape) != self.pattern.as_ref() {
                self.children.push(TransformSet::with_pattern(shape, transform));
                return;
            }
        }

        // Can't add or create a child. Store the transform at this node.
        self.transforms.push(transform);
    }

    pub fn add_range(&mut self, transforms: impl IntoIterator<Item = PatternTransform>) {
        for t in transforms {
            self.add(t);
        }
    }

    /// Number of transforms stored in this node and all children.
    pub fn count(&self) -> usize {
        self.transforms.len() + self.children.iter().map(|c| c.count()).sum::<usize>()
    }

    /// Transform `x` with the first successful transform in the set,
    /// accepting only rewrites that differ from the input and satisfy
    /// `validate`.
    pub fn transform_with(&self, x: &Expr, validate: &dyn Fn(&Expr) -> bool) -> Expr {
        // If the subject doesn't match the shape guard, nothing below this
        // node can match it either.
        if let Some(shape) = &self.pattern {
            if shape.matches(x).is_none() {
                return x.clone();
            }
        }

        // Try child nodes first.
        for child in &self.children {
            let xi = child.transform_with(x, validate);
            if xi != *x {
                return xi;
            }
        }

        // Then this node's transforms, in insertion order.
        for t in &self.transforms {
            let xi = t.transform(x);
            if xi != *x && validate(&xi) {
                debug!("transform set rewrote {} -> {}", x, xi);
                return xi;
            }
        }

        x.clone()
    }
}

impl Transform for TransformSet {
    fn transform(&self, x: &Expr) -> Expr {
        self.transform_with(x, &|_| true)
    }
}

//___________________________________ALGEBRA TRANSFORM____________________________________

// At every visited node E of one side, emit "E rewrites to equal"; recurse
// through sums (moving one term across) and products (moving one factor
// across, guarded by factor != 0).
fn generate_equivalents(e: &Expr, equal: Expr, conditions: &[Expr], target: &mut TransformSet) {
    target.add(PatternTransform::new(
        e.clone(),
        equal.clone(),
        conditions.to_vec(),
    ));
    match e {
        Expr::Sum(terms) => {
            for (i, term) in terms.iter().enumerate() {
                let rest = Expr::sum(all_except(terms, i));
                let moved = (equal.clone() - term.clone()).evaluate();
                generate_equivalents(&rest, moved, conditions, target);
            }
        }
        Expr::Product(terms) => {
            for (i, factor) in terms.iter().enumerate() {
                let rest = Expr::product(all_except(terms, i));
                let moved = (equal.clone() / factor.clone()).evaluate();
                let mut guarded = conditions.to_vec();
                guarded.push(Expr::call(
                    "NotEqual",
                    vec![factor.clone(), Expr::zero()],
                ));
                generate_equivalents(&rest, moved, &guarded, target);
            }
        }
        // No rearrangement across Pow is generated.
        _ => {}
    }
}

/// Transform set generated from the relationship `x = y` via basic algebraic
/// inverses. For example, given `Sin[a]*Cos[a]^-1 = Tan[a]`, also generates
/// `Sin[a] = Tan[a]*Cos[a]`.
#[derive(Debug)]
pub struct AlgebraTransform {
    set: TransformSet,
}

impl AlgebraTransform {
    pub fn new(x: Expr, y: Expr, preconditions: Vec<Expr>) -> AlgebraTransform {
        let mut set = TransformSet::new();
        generate_equivalents(&y, x.clone(), &preconditions, &mut set);
        generate_equivalents(&x, y, &preconditions, &mut set);
        AlgebraTransform { set }
    }

    pub fn set(&self) -> &TransformSet {
        &self.set
    }

    pub fn count(&self) -> usize {
        self.set.count()
    }
}

impl Transform for AlgebraTransform {
    fn transform(&self, x: &Expr) -> Expr {
        self.set.transform(x)
    }
}

//___________________________________CACHED TRANSFORM____________________________________

/// Cache the results of a transform. Only sound around a transform that is
/// referentially pure: the same subject must always rewrite identically.
pub struct CachedTransform<T: Transform> {
    cache: RefCell<HashMap<Expr, Expr>>,
    inner: T,
}

impl<T: Transform> CachedTransform<T> {
    pub fn new(inner: T) -> CachedTransform<T> {
        CachedTransform {
            cache: RefCell::new(HashMap::new()),
            inner,
        }
    }
}

impl<T: Transform> Transform for CachedTransform<T> {
    fn transform(&self, x: &Expr) -> Expr {
        if let Some(hit) = self.cache.borrow().get(x) {
            return hit.clone();
        }
        let result = self.inner.transform(x);
        self.cache
            .borrow_mut()
            .insert(x.clone(), result.clone());
        result
    }
}
