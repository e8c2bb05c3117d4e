//! # Symbolic Engine Module
//!
//! The expression tree at the heart of the engine. Expressions are immutable
//! after construction and are kept in a canonical normalized form by their
//! constructors, so that semantically identical expressions are structurally
//! identical: equality is element-wise comparison, hashing is structural, and
//! every later component (matching, rewriting, decomposition) can treat a sum
//! or product as a flat, already-normalized collection.
//!
//! ## Main Structures
//!
//! ### `Expr` Enum
//! A closed tagged union of node kinds:
//! - **`Const(Real)`** - numeric constant, exact rational or floating
//! - **`Var(String)`** - named unknown, also used as a pattern placeholder
//! - **`Call(String, Vec<Expr>)`** - named function applied to ordered arguments
//! - **`Sum(Vec<Expr>)`** / **`Product(Vec<Expr>)`** - canonical n-ary containers
//! - **`Pow(base, exponent)`** - binary power node
//!
//! ### Canonical form invariants (enforced by `Expr::sum` / `Expr::product`)
//! 1. no term of a Sum is itself a Sum (resp. Product of Product) - nested
//!    same-kind nodes are flattened at construction
//! 2. no term is the operator identity (0 for Sum, 1 for Product)
//! 3. terms are sorted by the canonical total order, so equal expressions
//!    produce identical term sequences
//! 4. zero terms collapse to the identity constant, one term collapses to
//!    the term itself
//!
//! ### Canonical total order
//! Constants order by descending absolute magnitude; atoms order by type
//! rank (Constant < Variable < Call) then by name; composite nodes order
//! lexicographically by their child sequences, treating a non-container
//! operand as a one-term sequence and a non-power operand as `(operand, 1)`.

use crate::symbolic::real_arithmetic::Real;
use std::cmp::Ordering;
use std::fmt;
use std::slice;

/// Core symbolic expression type. Built once through the canonical
/// constructors, never mutated, freely cloned and shared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Numeric constant.
    Const(Real),
    /// Named variable (unknown or pattern placeholder).
    Var(String),
    /// Application of a named function to an ordered argument list.
    Call(String, Vec<Expr>),
    /// Canonical n-ary sum.
    Sum(Vec<Expr>),
    /// Canonical n-ary product.
    Product(Vec<Expr>),
    /// base ^ exponent.
    Pow(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// BASIC CONSTRUCTORS

    pub fn constant(x: Real) -> Expr {
        Expr::Const(x)
    }

    pub fn int(n: i64) -> Expr {
        Expr::Const(Real::int(n))
    }

    pub fn rational(n: i64, d: i64) -> Expr {
        Expr::Const(Real::rational(n, d))
    }

    pub fn zero() -> Expr {
        Expr::Const(Real::zero())
    }

    pub fn one() -> Expr {
        Expr::Const(Real::one())
    }

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Call(name.to_string(), args)
    }

    /// Creates multiple symbolic variables from a comma-separated string.
    ///
    /// # Arguments
    /// * `symbols` - Comma-separated string of variable names (e.g., "x, y, z")
    ///
    /// # Returns
    /// Vector of `Expr::Var` instances for each variable name
    pub fn Symbols(symbols: &str) -> Vec<Expr> {
        symbols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Expr::var)
            .collect()
    }

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    //___________________________________CANONICAL FORM____________________________________

    fn flatten_sum_into(terms: Vec<Expr>, out: &mut Vec<Expr>) {
        for t in terms {
            match t {
                Expr::Sum(inner) => Self::flatten_sum_into(inner, out),
                t if t.is_zero() => {}
                t => out.push(t),
            }
        }
    }

    fn flatten_product_into(terms: Vec<Expr>, out: &mut Vec<Expr>) {
        for t in terms {
            match t {
                Expr::Product(inner) => Self::flatten_product_into(inner, out),
                t if t.is_one() => {}
                t => out.push(t),
            }
        }
    }

    /// Create a new sum expression in canonical form: nested sums are
    /// flattened, zero terms dropped, the rest sorted; zero terms collapse
    /// to the constant 0 and a single term collapses to itself.
    pub fn sum(terms: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(terms.len());
        Self::flatten_sum_into(terms, &mut flat);
        flat.sort();
        match flat.len() {
            0 => Expr::zero(),
            1 => flat.remove(0),
            _ => Expr::Sum(flat),
        }
    }

    /// Create a new product expression in canonical form. Same scheme as
    /// [`Expr::sum`] with identity 1.
    pub fn product(terms: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(terms.len());
        Self::flatten_product_into(terms, &mut flat);
        flat.sort();
        match flat.len() {
            0 => Expr::one(),
            1 => flat.remove(0),
            _ => Expr::Product(flat),
        }
    }

    /// Creates power expression self^rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    //___________________________________PREDICATES & ACCESSORS____________________________________

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(c) if c.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(c) if c.is_one())
    }

    /// Truth value of a condition expression: any nonzero constant.
    pub fn is_true(&self) -> bool {
        matches!(self, Expr::Const(c) if !c.is_zero())
    }

    pub fn as_real(&self) -> Option<&Real> {
        match self {
            Expr::Const(c) => Some(c),
            _ => None,
        }
    }

    /// The addition terms of this expression: its term list if it is a Sum,
    /// otherwise the expression itself as a one-term sequence.
    pub fn sum_terms(&self) -> &[Expr] {
        match self {
            Expr::Sum(terms) => terms,
            other => slice::from_ref(other),
        }
    }

    /// The multiplication terms of this expression, as [`Expr::sum_terms`].
    pub fn product_terms(&self) -> &[Expr] {
        match self {
            Expr::Product(terms) => terms,
            other => slice::from_ref(other),
        }
    }

    /// If this is `base^n` with a constant integer exponent, the pair
    /// `(base, n)`; otherwise `(self, 1)`.
    pub fn integral_exponent(&self) -> (&Expr, i64) {
        if let Expr::Pow(base, exp) = self {
            if let Expr::Const(c) = exp.as_ref() {
                if let Some(n) = c.to_i64() {
                    return (base, n);
                }
            }
        }
        (self, 1)
    }
}

//___________________________________OPERATORS____________________________________

impl std::ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::sum(vec![self, rhs])
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::sum(vec![self, -rhs])
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::product(vec![self, rhs])
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::product(vec![self, rhs.pow(Expr::int(-1))])
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::product(vec![Expr::int(-1), self])
    }
}

//___________________________________CANONICAL ORDER____________________________________

fn lex_cmp(a: &[Expr], b: &[Expr]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let c = x.cmp(y);
        if c != Ordering::Equal {
            return c;
        }
    }
    a.len().cmp(&b.len())
}

impl Expr {
    // Atoms sort Constant < Variable < Call.
    fn type_rank(&self) -> u8 {
        match self {
            Expr::Const(_) => 0,
            Expr::Var(_) => 1,
            Expr::Call(_, _) => 2,
            _ => 3,
        }
    }
}

impl Ord for Expr {
    fn cmp(&self, other: &Expr) -> Ordering {
        use Expr::*;
        match (self, other) {
            (Sum(a), Sum(b)) => lex_cmp(a, b),
            (Sum(a), _) => lex_cmp(a, slice::from_ref(other)),
            (_, Sum(b)) => lex_cmp(slice::from_ref(self), b),
            (Product(a), Product(b)) => lex_cmp(a, b),
            (Product(a), _) => lex_cmp(a, slice::from_ref(other)),
            (_, Product(b)) => lex_cmp(slice::from_ref(self), b),
            (Pow(l, r), Pow(l2, r2)) => l.cmp(l2).then_with(|| r.cmp(r2)),
            // A non-power operand compares as (operand, 1).
            (Pow(l, r), _) => l
                .as_ref()
                .cmp(other)
                .then_with(|| r.as_ref().cmp(&Expr::one())),
            (_, Pow(l2, r2)) => self
                .cmp(l2)
                .then_with(|| Expr::one().cmp(r2)),
            // This is *not* an arithmetic comparison, it is the
            // canonicalization ordering: larger magnitudes first.
            (Const(a), Const(b)) => b.abs().cmp(&a.abs()).then_with(|| a.cmp(b)),
            (Var(a), Var(b)) => a.cmp(b),
            (Call(f, a), Call(g, b)) => f.cmp(g).then_with(|| lex_cmp(a, b)),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Expr) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

//___________________________________DISPLAY____________________________________

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Sum(_) => 1,
            Expr::Product(_) => 2,
            Expr::Pow(_, _) => 3,
            _ => 4,
        }
    }

    // If this term would print with a leading minus sign, its negation for
    // rendering `a - b` instead of `a + -1*b`.
    fn negated_for_display(&self) -> Option<Expr> {
        match self {
            Expr::Const(c) if c.signum() < 0 => Some(Expr::Const(-c.clone())),
            Expr::Product(terms) => {
                if let Expr::Const(c) = &terms[0] {
                    if c.signum() < 0 {
                        let neg = -c.clone();
                        let mut rest: Vec<Expr> = terms[1..].to_vec();
                        if !neg.is_one() {
                            rest.insert(0, Expr::Const(neg));
                        }
                        return Some(if rest.len() == 1 {
                            rest.remove(0)
                        } else {
                            Expr::Product(rest)
                        });
                    }
                }
                None
            }
            _ => None,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter, parent: u8) -> fmt::Result {
        if self.precedence() < parent {
            write!(f, "(")?;
            self.fmt_prec(f, 0)?;
            return write!(f, ")");
        }
        match self {
            Expr::Const(c) => write!(f, "{}", c),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Call(name, args) => {
                write!(f, "{}[", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    a.fmt_prec(f, 0)?;
                }
                write!(f, "]")
            }
            Expr::Sum(terms) => {
                terms[0].fmt_prec(f, 1)?;
                for t in &terms[1..] {
                    match t.negated_for_display() {
                        Some(neg) => {
                            write!(f, " - ")?;
                            neg.fmt_prec(f, 2)?;
                        }
                        None => {
                            write!(f, " + ")?;
                            t.fmt_prec(f, 1)?;
                        }
                    }
                }
                Ok(())
            }
            Expr::Product(terms) => {
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    t.fmt_prec(f, 2)?;
                }
                Ok(())
            }
            Expr::Pow(base, exp) => {
                base.fmt_prec(f, 4)?;
                write!(f, "^")?;
                exp.fmt_prec(f, 3)
            }
        }
    }
}

/// Display implementation printing the conventional infix notation used by
/// circuit serialization: `a + b`, `a*b^2`, `Name[arg1, arg2]`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_flattens_nested_sums() {
        let inner = Expr::Sum(vec![Expr::var("x"), Expr::var("y")]);
        let e = Expr::sum(vec![inner, Expr::var("z")]);
        match e {
            Expr::Sum(terms) => assert_eq!(terms.len(), 3),
            other => panic!("expected a Sum, got {:?}", other),
        }
    }

    #[test]
    fn test_sum_drops_identity_terms() {
        let e = Expr::sum(vec![Expr::zero(), Expr::var("x"), Expr::zero()]);
        assert_eq!(e, Expr::var("x"));
    }

    #[test]
    fn test_product_drops_identity_terms() {
        let e = Expr::product(vec![Expr::one(), Expr::var("x"), Expr::one()]);
        assert_eq!(e, Expr::var("x"));
    }

    #[test]
    fn test_empty_collapses_to_identity() {
        assert_eq!(Expr::sum(vec![]), Expr::zero());
        assert_eq!(Expr::product(vec![]), Expr::one());
        assert_eq!(Expr::sum(vec![Expr::zero()]), Expr::zero());
        assert_eq!(Expr::product(vec![Expr::one()]), Expr::one());
    }

    #[test]
    fn test_terms_sorted_canonically() {
        let a = Expr::sum(vec![Expr::var("y"), Expr::int(3), Expr::var("x")]);
        let b = Expr::sum(vec![Expr::var("x"), Expr::var("y"), Expr::int(3)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_constants_order_by_descending_magnitude() {
        let e = Expr::sum(vec![Expr::int(2), Expr::int(-5), Expr::int(3)]);
        match e {
            Expr::Sum(terms) => {
                assert_eq!(terms[0], Expr::int(-5));
                assert_eq!(terms[1], Expr::int(3));
                assert_eq!(terms[2], Expr::int(2));
            }
            other => panic!("expected a Sum, got {:?}", other),
        }
    }

    #[test]
    fn test_atom_type_rank() {
        assert!(Expr::int(7) < Expr::var("a"));
        assert!(Expr::var("a") < Expr::call("F", vec![Expr::var("a")]));
        assert!(Expr::var("a") < Expr::var("b"));
    }

    #[test]
    fn test_power_orders_as_base_then_exponent() {
        let x = Expr::var("x");
        let x2 = x.clone().pow(Expr::int(2));
        // x compares as (x, 1), so x < x^2.
        assert!(x < x2);
    }

    #[test]
    fn test_equal_trees_hash_equal() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let a = Expr::sum(vec![Expr::var("y"), Expr::var("x")]);
        let b = Expr::sum(vec![Expr::var("x"), Expr::var("y")]);
        let hash = |e: &Expr| {
            let mut h = DefaultHasher::new();
            e.hash(&mut h);
            h.finish()
        };
        assert_eq!(a, b);
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_display_infix() {
        let x = Expr::var("x");
        let e = Expr::sum(vec![
            Expr::var("a"),
            Expr::product(vec![Expr::var("b"), x.clone().pow(Expr::int(2))]),
        ]);
        assert_eq!(format!("{}", e), "a + b*x^2");
        let call = Expr::call("Sin", vec![x.clone()]);
        assert_eq!(format!("{}", call), "Sin[x]");
        let neg = Expr::sum(vec![Expr::var("a"), -Expr::var("b")]);
        assert_eq!(format!("{}", neg), "a - b");
    }

    #[test]
    fn test_display_parenthesizes_by_precedence() {
        let e = Expr::product(vec![
            Expr::sum(vec![Expr::var("a"), Expr::var("b")]),
            Expr::var("c"),
        ]);
        assert_eq!(format!("{}", e), "(a + b)*c");
        let p = Expr::sum(vec![Expr::var("a"), Expr::var("b")]).pow(Expr::int(2));
        assert_eq!(format!("{}", p), "(a + b)^2");
    }

    #[test]
    fn test_Symbols() {
        let vars = Expr::Symbols("x, y, z");
        assert_eq!(vars.len(), 3);
        assert_eq!(vars[0], Expr::var("x"));
    }
}
