//! # Evaluation Module
//!
//! Canonical evaluation of expression trees: constant folding, like-term
//! collection, exponent accumulation and the power identities, plus the
//! supporting operations every consumer of the engine needs - substitution,
//! dependency queries, distribution/expansion and full numeric evaluation
//! through the native function registry.
//!
//! ## Evaluation rules
//!
//! 1. **Sums** accumulate a running constant and a coefficient per distinct
//!    term: `x + 2*x` collects to `3*x`, `x - x` vanishes.
//! 2. **Products** accumulate a running constant and an exponent per distinct
//!    base: `x*x^2` collects to `x^3`; a zero factor annihilates the whole
//!    product; a leftover constant is distributed into a contained sum with a
//!    unit exponent.
//! 3. **Powers** distribute over products, merge nested powers, apply the
//!    0/1 identities and fold constant base/exponent pairs through
//!    [`Real::pow`].
//! 4. **Calls** fold the `Equal`/`NotEqual` predicates when decidable and
//!    fully-constant calls through the registered native function.

use crate::symbolic::real_arithmetic::Real;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::all_except;
use std::collections::HashMap;
use std::sync::OnceLock;

//___________________________________NATIVE FUNCTIONS____________________________________

/// A native implementation of a function symbol, called during evaluation
/// when every argument is a constant.
pub type NativeFn = fn(&[Real]) -> Real;

/// Name -> (arity, implementation) table for function symbols.
pub struct FunctionRegistry {
    functions: HashMap<String, (usize, NativeFn)>,
}

impl FunctionRegistry {
    pub fn new() -> FunctionRegistry {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// The standard function set: trigonometric, hyperbolic, exponential and
    /// rounding/utility functions.
    pub fn standard() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry.register("Sin", 1, |a| a[0].sin());
        registry.register("Cos", 1, |a| a[0].cos());
        registry.register("Tan", 1, |a| a[0].tan());
        registry.register("Sec", 1, |a| Real::one() / a[0].cos());
        registry.register("Csc", 1, |a| Real::one() / a[0].sin());
        registry.register("Cot", 1, |a| Real::one() / a[0].tan());
        registry.register("ArcSin", 1, |a| a[0].arcsin());
        registry.register("ArcCos", 1, |a| a[0].arccos());
        registry.register("ArcTan", 1, |a| a[0].arctan());
        registry.register("Sinh", 1, |a| a[0].sinh());
        registry.register("Cosh", 1, |a| a[0].cosh());
        registry.register("Tanh", 1, |a| a[0].tanh());
        registry.register("Sqrt", 1, |a| a[0].sqrt());
        registry.register("Exp", 1, |a| a[0].exp());
        registry.register("Ln", 1, |a| a[0].ln());
        registry.register("Log", 2, |a| a[0].log(&a[1]));
        registry.register("Abs", 1, |a| a[0].abs());
        registry.register("Sign", 1, |a| Real::int(a[0].signum() as i64));
        registry.register("Min", 2, |a| a[0].clone().min(a[1].clone()));
        registry.register("Max", 2, |a| a[0].clone().max(a[1].clone()));
        registry.register("Floor", 1, |a| a[0].floor());
        registry.register("Ceiling", 1, |a| a[0].ceiling());
        registry.register("Round", 1, |a| a[0].round());
        registry
    }

    pub fn register(&mut self, name: &str, arity: usize, f: NativeFn) {
        self.functions.insert(name.to_string(), (arity, f));
    }

    pub fn lookup(&self, name: &str) -> Option<&(usize, NativeFn)> {
        self.functions.get(name)
    }

    /// Call a registered function. An unknown symbol or an arity mismatch is
    /// an invalid-operation error naming the symbol.
    pub fn call(&self, name: &str, args: &[Real]) -> Result<Real, String> {
        match self.functions.get(name) {
            Some((arity, f)) => {
                if *arity != args.len() {
                    Err(format!(
                        "function '{}' expects {} argument(s), got {}",
                        name,
                        arity,
                        args.len()
                    ))
                } else {
                    Ok(f(args))
                }
            }
            None => Err(format!(
                "no native implementation registered for function '{}'",
                name
            )),
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> FunctionRegistry {
        FunctionRegistry::standard()
    }
}

/// The process-wide registry used by evaluation, built on first use.
pub fn global_registry() -> &'static FunctionRegistry {
    static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FunctionRegistry::standard)
}

//___________________________________EVALUATION____________________________________

/// Canonical evaluation of a flat list of addition terms (each already
/// evaluated): accumulate constants and the coefficient of each distinct
/// term.
pub(crate) fn evaluate_sum(terms: Vec<Expr>) -> Expr {
    let mut coefficients: HashMap<Expr, Real> = HashMap::new();
    let mut constant = Real::zero();

    for t in terms {
        if let Expr::Const(c) = t {
            constant = constant + c;
            continue;
        }
        // Split off the constant factor of the term, if any.
        let factors = t.product_terms();
        let const_at = factors.iter().position(|f| matches!(f, Expr::Const(_)));
        match const_at {
            Some(at) => {
                let coeff = match &factors[at] {
                    Expr::Const(c) => c.clone(),
                    _ => Real::one(),
                };
                let key = Expr::product(all_except(factors, at));
                let entry = coefficients.entry(key).or_insert_with(Real::zero);
                *entry = entry.clone() + coeff;
            }
            None => {
                let entry = coefficients.entry(t).or_insert_with(Real::zero);
                *entry = entry.clone() + Real::one();
            }
        }
    }

    let mut result: Vec<Expr> = coefficients
        .into_iter()
        .filter(|(_, coeff)| !coeff.is_zero())
        .map(|(term, coeff)| {
            if coeff.is_one() {
                term
            } else {
                Expr::product(vec![term, Expr::Const(coeff)])
            }
        })
        .collect();
    if !constant.is_zero() {
        result.push(Expr::Const(constant));
    }
    Expr::sum(result)
}

// Canonical evaluation of a flat list of multiplication terms (each already
// evaluated): accumulate constants and the exponent of each distinct base.
fn evaluate_product(terms: Vec<Expr>) -> Expr {
    let mut exponents: HashMap<Expr, Real> = HashMap::new();
    let mut constant = Real::one();

    for t in terms {
        if let Expr::Const(c) = t {
            constant = constant * c;
            continue;
        }
        if let Expr::Pow(base, exp) = &t {
            if let Expr::Const(ec) = exp.as_ref() {
                let entry = exponents
                    .entry(base.as_ref().clone())
                    .or_insert_with(Real::zero);
                *entry = entry.clone() + ec.clone();
                continue;
            }
        }
        let entry = exponents.entry(t).or_insert_with(Real::zero);
        *entry = entry.clone() + Real::one();
    }

    if constant.is_zero() {
        return Expr::zero();
    }

    let mut result: Vec<Expr> = Vec::with_capacity(exponents.len() + 1);
    if !constant.is_one() {
        // Distribute the constant into a sum factor with a unit exponent,
        // if there is one; otherwise keep it as its own factor.
        let sum_key = exponents
            .iter()
            .find(|(k, v)| v.abs().is_one() && matches!(k, Expr::Sum(_)))
            .map(|(k, v)| (k.clone(), v.clone()));
        match sum_key {
            Some((key, exp)) => {
                exponents.remove(&key);
                let distributed = distribute(&Expr::Const(constant.pow(&exp)), &key);
                let entry = exponents.entry(distributed).or_insert_with(Real::zero);
                *entry = entry.clone() + exp;
            }
            None => result.push(Expr::Const(constant)),
        }
    }

    result.extend(
        exponents
            .into_iter()
            .filter(|(_, exp)| !exp.is_zero())
            .map(|(base, exp)| {
                if exp.is_one() {
                    base
                } else {
                    base.pow(Expr::Const(exp))
                }
            }),
    );
    Expr::product(result)
}

fn evaluate_power(base: &Expr, exp: &Expr) -> Expr {
    let l = base.evaluate();

    // (x*y)^z => x^z * y^z.
    if let Expr::Product(factors) = &l {
        return Expr::product(
            factors
                .iter()
                .map(|f| f.clone().pow(exp.clone()))
                .collect(),
        )
        .evaluate();
    }

    let mut l = l;
    let mut r = exp.evaluate();

    // (x^y)^z => x^(y*z).
    if let Expr::Pow(inner_base, inner_exp) = l {
        l = *inner_base;
        r = Expr::product(vec![r, *inner_exp]).evaluate();
    }

    // Identities.
    if l.is_zero() {
        return Expr::zero();
    }
    if l.is_one() {
        return Expr::one();
    }
    if r.is_zero() {
        return Expr::one();
    }
    if r.is_one() {
        return l;
    }

    if let (Expr::Const(lc), Expr::Const(rc)) = (&l, &r) {
        return Expr::Const(lc.pow(rc));
    }
    Expr::Pow(l.boxed(), r.boxed())
}

fn evaluate_call(name: &str, args: &[Expr]) -> Expr {
    let args: Vec<Expr> = args.iter().map(|a| a.evaluate()).collect();

    // Predicates decidable without numeric values.
    if args.len() == 2 {
        match name {
            "Equal" => {
                if args[0] == args[1] {
                    return Expr::one();
                }
                if args.iter().all(|a| matches!(a, Expr::Const(_))) {
                    return Expr::zero();
                }
            }
            "NotEqual" => {
                if args[0] == args[1] {
                    return Expr::zero();
                }
                if args.iter().all(|a| matches!(a, Expr::Const(_))) {
                    return Expr::one();
                }
            }
            _ => {}
        }
    }

    if args.iter().all(|a| matches!(a, Expr::Const(_))) {
        if let Some((arity, f)) = global_registry().lookup(name) {
            if *arity == args.len() {
                let values: Vec<Real> = args
                    .iter()
                    .filter_map(|a| a.as_real().cloned())
                    .collect();
                return Expr::Const(f(&values));
            }
        }
    }
    Expr::Call(name.to_string(), args)
}

/// Evaluate `x*a`, distributing over sum operands.
pub(crate) fn distribute(x: &Expr, a: &Expr) -> Expr {
    if matches!(a, Expr::Sum(_)) || matches!(x, Expr::Sum(_)) {
        let mut terms = Vec::new();
        for i in a.sum_terms() {
            let d = distribute(i, x);
            terms.extend(d.sum_terms().iter().cloned());
        }
        evaluate_sum(terms)
    } else {
        Expr::product(vec![a.clone(), x.clone()]).evaluate()
    }
}

impl Expr {
    /// Evaluate this expression: fold constants, collect like terms and
    /// exponents, apply the power identities and call native functions on
    /// constant arguments. The result is in canonical evaluated form.
    pub fn evaluate(&self) -> Expr {
        match self {
            Expr::Const(_) | Expr::Var(_) => self.clone(),
            Expr::Sum(terms) => {
                let mut flat = Vec::with_capacity(terms.len());
                for t in terms {
                    let v = t.evaluate();
                    flat.extend(v.sum_terms().iter().cloned());
                }
                evaluate_sum(flat)
            }
            Expr::Product(terms) => {
                let mut flat = Vec::with_capacity(terms.len());
                for t in terms {
                    let v = t.evaluate();
                    flat.extend(v.product_terms().iter().cloned());
                }
                evaluate_product(flat)
            }
            Expr::Pow(base, exp) => evaluate_power(base, exp),
            Expr::Call(name, args) => evaluate_call(name, args),
        }
    }

    /// Substitute expressions per `map` (whole-node lookup first, then
    /// recursion), rebuilding through the canonical constructors.
    pub fn substitute(&self, map: &HashMap<Expr, Expr>) -> Expr {
        if map.is_empty() {
            return self.clone();
        }
        if let Some(replacement) = map.get(self) {
            return replacement.clone();
        }
        match self {
            Expr::Const(_) | Expr::Var(_) => self.clone(),
            Expr::Call(name, args) => Expr::Call(
                name.clone(),
                args.iter().map(|a| a.substitute(map)).collect(),
            ),
            Expr::Sum(terms) => {
                Expr::sum(terms.iter().map(|t| t.substitute(map)).collect())
            }
            Expr::Product(terms) => {
                Expr::product(terms.iter().map(|t| t.substitute(map)).collect())
            }
            Expr::Pow(base, exp) => {
                Expr::Pow(base.substitute(map).boxed(), exp.substitute(map).boxed())
            }
        }
    }

    /// Check if any expression in `xs` occurs as a subexpression of self.
    pub fn depends_on(&self, xs: &[Expr]) -> bool {
        if xs.iter().any(|x| x == self) {
            return true;
        }
        match self {
            Expr::Const(_) | Expr::Var(_) => false,
            Expr::Call(_, args) => args.iter().any(|a| a.depends_on(xs)),
            Expr::Sum(terms) | Expr::Product(terms) => terms.iter().any(|t| t.depends_on(xs)),
            Expr::Pow(base, exp) => base.depends_on(xs) || exp.depends_on(xs),
        }
    }

    /// Distribute products across sums and expand positive integer powers
    /// of sums by repeated distribution.
    pub fn expand(&self) -> Expr {
        match self {
            Expr::Product(factors) => {
                if factors.iter().any(|f| matches!(f, Expr::Sum(_))) {
                    let mut acc = Expr::one();
                    for f in factors {
                        acc = distribute(&f.expand(), &acc);
                    }
                    acc
                } else {
                    self.clone()
                }
            }
            Expr::Sum(terms) => Expr::sum(terms.iter().map(|t| t.expand()).collect()),
            Expr::Pow(base, exp) => {
                if let Expr::Const(c) = exp.as_ref() {
                    if let Some(n) = c.to_i64() {
                        if n > 1 && matches!(base.as_ref(), Expr::Sum(_)) {
                            let mut e = base.as_ref().clone();
                            for _ in 1..n {
                                e = distribute(base, &e);
                            }
                            return e;
                        }
                    }
                }
                self.clone()
            }
            _ => self.clone(),
        }
    }

    /// Fully numeric evaluation at the given variable values. An unbound
    /// variable or an unregistered function symbol is an error naming it.
    pub fn eval_numeric(&self, vars: &HashMap<String, Real>) -> Result<Real, String> {
        match self {
            Expr::Const(c) => Ok(c.clone()),
            Expr::Var(name) => vars
                .get(name)
                .cloned()
                .ok_or_else(|| format!("no value bound for variable '{}'", name)),
            Expr::Sum(terms) => {
                let mut acc = Real::zero();
                for t in terms {
                    acc = acc + t.eval_numeric(vars)?;
                }
                Ok(acc)
            }
            Expr::Product(terms) => {
                let mut acc = Real::one();
                for t in terms {
                    acc = acc * t.eval_numeric(vars)?;
                }
                Ok(acc)
            }
            Expr::Pow(base, exp) => {
                Ok(base.eval_numeric(vars)?.pow(&exp.eval_numeric(vars)?))
            }
            Expr::Call(name, args) => {
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(a.eval_numeric(vars)?);
                }
                global_registry().call(name, &values)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_folding() {
        let e = Expr::int(2) + Expr::int(3) * Expr::int(4);
        assert_eq!(e.evaluate(), Expr::int(14));
    }

    #[test]
    fn test_like_terms_collect() {
        let x = Expr::var("x");
        let e = (x.clone() + x.clone()).evaluate();
        assert_eq!(e, Expr::product(vec![Expr::int(2), Expr::var("x")]));
        let cancel = (x.clone() - x).evaluate();
        assert_eq!(cancel, Expr::zero());
    }

    #[test]
    fn test_coefficients_accumulate() {
        let x = Expr::var("x");
        let e = (Expr::int(3) * x.clone() + Expr::int(2) * x.clone()).evaluate();
        assert_eq!(e, Expr::product(vec![Expr::int(5), Expr::var("x")]));
    }

    #[test]
    fn test_exponents_accumulate() {
        let x = Expr::var("x");
        let e = (x.clone() * x.clone().pow(Expr::int(2))).evaluate();
        assert_eq!(e, Expr::var("x").pow(Expr::int(3)));
        // x * x^-1 = 1.
        let cancel = (x.clone() * x.pow(Expr::int(-1))).evaluate();
        assert_eq!(cancel, Expr::one());
    }

    #[test]
    fn test_zero_annihilates_product() {
        let e = (Expr::zero() * Expr::var("x") * Expr::call("Sin", vec![Expr::var("y")]))
            .evaluate();
        assert_eq!(e, Expr::zero());
    }

    #[test]
    fn test_power_identities() {
        let x = Expr::var("x");
        assert_eq!(x.clone().pow(Expr::int(0)).evaluate(), Expr::one());
        assert_eq!(x.clone().pow(Expr::int(1)).evaluate(), x.clone());
        assert_eq!(Expr::one().pow(x.clone()).evaluate(), Expr::one());
        assert_eq!(Expr::zero().pow(x.clone()).evaluate(), Expr::zero());
        // (x^2)^3 = x^6.
        let nested = x.clone().pow(Expr::int(2)).pow(Expr::int(3)).evaluate();
        assert_eq!(nested, x.pow(Expr::int(6)));
    }

    #[test]
    fn test_power_distributes_over_product() {
        let e = (Expr::var("x") * Expr::var("y")).pow(Expr::int(2)).evaluate();
        assert_eq!(
            e,
            Expr::product(vec![
                Expr::var("x").pow(Expr::int(2)),
                Expr::var("y").pow(Expr::int(2)),
            ])
        );
    }

    #[test]
    fn test_rational_power_folding() {
        let e = Expr::rational(2, 3).pow(Expr::int(2)).evaluate();
        assert_eq!(e, Expr::rational(4, 9));
    }

    #[test]
    fn test_native_call_folds_constants() {
        let e = Expr::call("Sin", vec![Expr::zero()]).evaluate();
        assert_eq!(e, Expr::Const(Real::from(0.0)));
        let e = Expr::call("Exp", vec![Expr::one()]).evaluate();
        match e {
            Expr::Const(c) => assert_relative_eq!(c.to_f64(), std::f64::consts::E),
            other => panic!("expected a constant, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_call_stays_symbolic() {
        let e = Expr::call("Mystery", vec![Expr::one()]).evaluate();
        assert_eq!(e, Expr::call("Mystery", vec![Expr::one()]));
    }

    #[test]
    fn test_predicates() {
        let x = Expr::var("x");
        let eq = Expr::call("Equal", vec![x.clone(), x.clone()]).evaluate();
        assert_eq!(eq, Expr::one());
        let ne = Expr::call("NotEqual", vec![x.clone(), x.clone()]).evaluate();
        assert_eq!(ne, Expr::zero());
        let ne_const = Expr::call("NotEqual", vec![Expr::int(2), Expr::zero()]).evaluate();
        assert_eq!(ne_const, Expr::one());
        // Undecidable without values: stays symbolic.
        let open = Expr::call("NotEqual", vec![x, Expr::zero()]).evaluate();
        assert!(matches!(open, Expr::Call(_, _)));
    }

    #[test]
    fn test_substitute() {
        let pattern = Expr::var("a") + Expr::var("b");
        let mut map = HashMap::new();
        map.insert(Expr::var("a"), Expr::int(1));
        map.insert(Expr::var("b"), Expr::var("x"));
        let e = pattern.substitute(&map);
        assert_eq!(e, Expr::sum(vec![Expr::int(1), Expr::var("x")]));
    }

    #[test]
    fn test_depends_on() {
        let x = Expr::var("x");
        let e = Expr::call("Sin", vec![x.clone()]) + Expr::var("y");
        assert!(e.depends_on(&[x.clone()]));
        assert!(e.depends_on(&[Expr::var("y")]));
        assert!(!e.depends_on(&[Expr::var("z")]));
    }

    #[test]
    fn test_expand_distributes() {
        let e = Expr::var("x") * (Expr::var("y") + Expr::var("z"));
        let expanded = e.expand();
        let expected = (Expr::var("x") * Expr::var("y") + Expr::var("x") * Expr::var("z"))
            .evaluate();
        assert_eq!(expanded, expected);
    }

    #[test]
    fn test_expand_power_of_sum() {
        let e = (Expr::var("a") + Expr::var("b")).pow(Expr::int(2));
        let expanded = e.expand();
        // a^2 + 2*a*b + b^2.
        let expected = (Expr::var("a").pow(Expr::int(2))
            + Expr::int(2) * Expr::var("a") * Expr::var("b")
            + Expr::var("b").pow(Expr::int(2)))
        .evaluate();
        assert_eq!(expanded, expected);
    }

    #[test]
    fn test_constant_distributes_into_sum_factor() {
        // 2*(x + y) evaluates with the constant pushed inside.
        let e = (Expr::int(2) * (Expr::var("x") + Expr::var("y"))).evaluate();
        let expected = (Expr::int(2) * Expr::var("x") + Expr::int(2) * Expr::var("y"))
            .evaluate();
        assert_eq!(e, expected);
    }

    #[test]
    fn test_eval_numeric() {
        let mut vars = HashMap::new();
        vars.insert("x".to_string(), Real::int(3));
        let e = Expr::var("x").pow(Expr::int(2)) + Expr::one();
        assert_eq!(e.eval_numeric(&vars).unwrap(), Real::int(10));
    }

    #[test]
    fn test_eval_numeric_errors() {
        let vars = HashMap::new();
        let unbound = Expr::var("x").eval_numeric(&vars);
        assert!(unbound.unwrap_err().contains("x"));
        let unknown = Expr::call("Mystery", vec![Expr::one()]).eval_numeric(&vars);
        assert!(unknown.unwrap_err().contains("Mystery"));
    }
}
