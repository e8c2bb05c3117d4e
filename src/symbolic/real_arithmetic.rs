//! # Real Arithmetic Module
//!
//! Arbitrary-precision real numbers for the symbolic engine. A `Real` holds a
//! value either exactly, as a big-integer rational, or approximately, as an
//! `f64` once exactness is lost. Every constant in an expression tree carries
//! a `Real`, so the rules here decide when the whole engine stays exact.
//!
//! ## Representation rules
//!
//! - Integers, `(numerator, denominator)` pairs and `BigRational` values are
//!   held as `Real::Rational`. The rational is kept reduced by GCD with a
//!   positive denominator (the `num` crate maintains that invariant).
//! - Construction from `f64` produces `Real::Double`. The conversion is one
//!   way: arithmetic never upgrades a `Double` back to `Rational`.
//! - Arithmetic between two rationals stays rational; any `Double` operand
//!   makes the result a `Double`.
//! - Transcendental functions always produce a `Double`.
//! - The one rational operation that cannot stay exact is division by an
//!   exact zero, which falls to the floating representation (infinity/NaN).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

use num::BigRational;
use num::bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Numeric value of a constant: exact rational or floating-point fallback.
#[derive(Clone, Debug)]
pub enum Real {
    /// Exact value, numerator/denominator reduced by GCD, denominator > 0.
    Rational(BigRational),
    /// Inexact value. Entered explicitly, never left implicitly.
    Double(f64),
}

impl Real {
    pub fn zero() -> Real {
        Real::Rational(BigRational::zero())
    }

    pub fn one() -> Real {
        Real::Rational(BigRational::one())
    }

    /// Exact rational from an integer.
    pub fn int(n: i64) -> Real {
        Real::Rational(BigRational::from_integer(BigInt::from(n)))
    }

    /// Exact rational `n/d`.
    ///
    /// # Panics
    /// Panics if `d` is zero; a zero denominator is a caller bug, not a value.
    pub fn rational(n: i64, d: i64) -> Real {
        Real::Rational(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Real::Rational(r) => r.is_zero(),
            Real::Double(d) => *d == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Real::Rational(r) => r.is_one(),
            Real::Double(d) => *d == 1.0,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Real::Rational(r) => r.is_integer(),
            Real::Double(d) => d.fract() == 0.0 && d.is_finite(),
        }
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Real::Rational(_) => false,
            Real::Double(d) => d.is_nan(),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Real::Rational(r) => r.to_f64().unwrap_or(f64::NAN),
            Real::Double(d) => *d,
        }
    }

    /// The value as an integer, if it is one.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Real::Rational(r) if r.is_integer() => r.to_integer().to_i64(),
            Real::Double(d) if d.fract() == 0.0 && d.is_finite() => {
                if *d >= i64::MIN as f64 && *d <= i64::MAX as f64 {
                    Some(*d as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn abs(&self) -> Real {
        match self {
            Real::Rational(r) => Real::Rational(r.abs()),
            Real::Double(d) => Real::Double(d.abs()),
        }
    }

    /// Sign of the value: -1, 0 or 1.
    pub fn signum(&self) -> i32 {
        match self {
            Real::Rational(r) => {
                if r.is_zero() {
                    0
                } else if r.is_positive() {
                    1
                } else {
                    -1
                }
            }
            Real::Double(d) => {
                if *d == 0.0 || d.is_nan() {
                    0
                } else if *d > 0.0 {
                    1
                } else {
                    -1
                }
            }
        }
    }

    pub fn floor(&self) -> Real {
        match self {
            Real::Rational(r) => Real::Rational(r.floor()),
            Real::Double(d) => Real::Double(d.floor()),
        }
    }

    pub fn ceiling(&self) -> Real {
        match self {
            Real::Rational(r) => Real::Rational(r.ceil()),
            Real::Double(d) => Real::Double(d.ceil()),
        }
    }

    pub fn round(&self) -> Real {
        match self {
            Real::Rational(r) => Real::Rational(r.round()),
            Real::Double(d) => Real::Double(d.round()),
        }
    }

    /// Raise to a power. An integer exponent on a rational base stays
    /// rational (negative exponents invert the fraction); everything else
    /// goes through `f64::powf`. `0^-n` falls to floating infinity.
    pub fn pow(&self, rhs: &Real) -> Real {
        if let (Real::Rational(a), Real::Rational(b)) = (self, rhs) {
            if b.is_integer() {
                if let Some(k) = b.to_integer().to_i32() {
                    if k >= 0 || !a.is_zero() {
                        return Real::Rational(a.pow(k));
                    }
                }
            }
        }
        Real::Double(self.to_f64().powf(rhs.to_f64()))
    }

    pub fn min(self, other: Real) -> Real {
        if self <= other { self } else { other }
    }

    pub fn max(self, other: Real) -> Real {
        if self >= other { self } else { other }
    }

    // Transcendental functions, always inexact.
    pub fn sin(&self) -> Real {
        Real::Double(self.to_f64().sin())
    }
    pub fn cos(&self) -> Real {
        Real::Double(self.to_f64().cos())
    }
    pub fn tan(&self) -> Real {
        Real::Double(self.to_f64().tan())
    }
    pub fn arcsin(&self) -> Real {
        Real::Double(self.to_f64().asin())
    }
    pub fn arccos(&self) -> Real {
        Real::Double(self.to_f64().acos())
    }
    pub fn arctan(&self) -> Real {
        Real::Double(self.to_f64().atan())
    }
    pub fn sinh(&self) -> Real {
        Real::Double(self.to_f64().sinh())
    }
    pub fn cosh(&self) -> Real {
        Real::Double(self.to_f64().cosh())
    }
    pub fn tanh(&self) -> Real {
        Real::Double(self.to_f64().tanh())
    }
    pub fn sqrt(&self) -> Real {
        Real::Double(self.to_f64().sqrt())
    }
    pub fn exp(&self) -> Real {
        Real::Double(self.to_f64().exp())
    }
    pub fn ln(&self) -> Real {
        Real::Double(self.to_f64().ln())
    }
    pub fn log(&self, base: &Real) -> Real {
        Real::Double(self.to_f64().log(base.to_f64()))
    }
}

impl From<i64> for Real {
    fn from(n: i64) -> Real {
        Real::int(n)
    }
}

impl From<i32> for Real {
    fn from(n: i32) -> Real {
        Real::int(n as i64)
    }
}

impl From<BigInt> for Real {
    fn from(n: BigInt) -> Real {
        Real::Rational(BigRational::from_integer(n))
    }
}

impl From<BigRational> for Real {
    fn from(r: BigRational) -> Real {
        Real::Rational(r)
    }
}

impl From<f64> for Real {
    fn from(d: f64) -> Real {
        Real::Double(d)
    }
}

impl Add for Real {
    type Output = Real;

    fn add(self, rhs: Real) -> Real {
        match (self, rhs) {
            (Real::Rational(a), Real::Rational(b)) => Real::Rational(a + b),
            (a, b) => Real::Double(a.to_f64() + b.to_f64()),
        }
    }
}

impl Sub for Real {
    type Output = Real;

    fn sub(self, rhs: Real) -> Real {
        match (self, rhs) {
            (Real::Rational(a), Real::Rational(b)) => Real::Rational(a - b),
            (a, b) => Real::Double(a.to_f64() - b.to_f64()),
        }
    }
}

impl Mul for Real {
    type Output = Real;

    fn mul(self, rhs: Real) -> Real {
        match (self, rhs) {
            (Real::Rational(a), Real::Rational(b)) => Real::Rational(a * b),
            (a, b) => Real::Double(a.to_f64() * b.to_f64()),
        }
    }
}

impl Div for Real {
    type Output = Real;

    fn div(self, rhs: Real) -> Real {
        match (self, rhs) {
            (Real::Rational(a), Real::Rational(b)) => {
                if b.is_zero() {
                    // The only rational operation that cannot stay exact.
                    Real::Double(a.to_f64().unwrap_or(f64::NAN) / 0.0)
                } else {
                    Real::Rational(a / b)
                }
            }
            (a, b) => Real::Double(a.to_f64() / b.to_f64()),
        }
    }
}

impl Rem for Real {
    type Output = Real;

    /// `a % b = a - floor(a/b)*b`.
    fn rem(self, rhs: Real) -> Real {
        match (&self, &rhs) {
            (Real::Rational(a), Real::Rational(b)) if !b.is_zero() => {
                Real::Rational(a - (a / b).floor() * b)
            }
            _ => {
                let a = self.to_f64();
                let b = rhs.to_f64();
                Real::Double(a - (a / b).floor() * b)
            }
        }
    }
}

impl Neg for Real {
    type Output = Real;

    fn neg(self) -> Real {
        match self {
            Real::Rational(r) => Real::Rational(-r),
            Real::Double(d) => Real::Double(-d),
        }
    }
}

// A rational numerically equal to a double still orders before it, so that
// the total order agrees with the representation-strict equality.
fn cmp_rational_double(a: &BigRational, b: f64) -> Ordering {
    match BigRational::from_float(b) {
        Some(exact_b) => a.cmp(&exact_b).then(Ordering::Less),
        // b is NaN or an infinity; rationals sort below NaN and +inf,
        // above -inf.
        None => {
            if b == f64::NEG_INFINITY {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
    }
}

impl Ord for Real {
    fn cmp(&self, other: &Real) -> Ordering {
        match (self, other) {
            (Real::Rational(a), Real::Rational(b)) => a.cmp(b),
            (Real::Double(a), Real::Double(b)) => a.total_cmp(b),
            (Real::Rational(a), Real::Double(b)) => cmp_rational_double(a, *b),
            (Real::Double(a), Real::Rational(b)) => cmp_rational_double(b, *a).reverse(),
        }
    }
}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Real) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Real) -> bool {
        match (self, other) {
            (Real::Rational(a), Real::Rational(b)) => a == b,
            (Real::Double(a), Real::Double(b)) => a.total_cmp(b) == Ordering::Equal,
            _ => false,
        }
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Real::Rational(r) => {
                0u8.hash(state);
                r.hash(state);
            }
            Real::Double(d) => {
                1u8.hash(state);
                d.to_bits().hash(state);
            }
        }
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Real::Rational(r) => {
                if r.is_integer() {
                    write!(f, "{}", r.numer())
                } else {
                    write!(f, "{}/{}", r.numer(), r.denom())
                }
            }
            Real::Double(d) => write!(f, "{}", d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rational_addition_is_exact() {
        // (p/q) + (r/s) == (p*s + r*q) / (q*s), reduced.
        let cases = [(1i64, 3i64, 1i64, 6i64), (2, 7, 3, 5), (-4, 9, 4, 9), (5, 10, 1, 2)];
        for (p, q, r, s) in cases {
            let sum = Real::rational(p, q) + Real::rational(r, s);
            assert_eq!(sum, Real::rational(p * s + r * q, q * s));
        }
    }

    #[test]
    fn test_double_contagion() {
        let a = Real::rational(1, 3);
        let b = Real::from(0.5);
        assert!(matches!(a.clone() + b.clone(), Real::Double(_)));
        assert!(matches!(a.clone() * b.clone(), Real::Double(_)));
        assert!(matches!(b / a, Real::Double(_)));
        // No silent upgrade back: a double times a rational one stays double.
        assert!(matches!(Real::from(2.0) * Real::one(), Real::Double(_)));
    }

    #[test]
    fn test_integer_power_stays_rational() {
        let x = Real::rational(2, 3);
        assert_eq!(x.pow(&Real::int(3)), Real::rational(8, 27));
        assert_eq!(x.pow(&Real::int(-2)), Real::rational(9, 4));
        assert_eq!(Real::int(10).pow(&Real::int(0)), Real::one());
    }

    #[test]
    fn test_fractional_power_falls_to_double() {
        let r = Real::int(2).pow(&Real::rational(1, 2));
        assert!(matches!(r, Real::Double(_)));
        assert_relative_eq!(r.to_f64(), 2.0f64.sqrt());
    }

    #[test]
    fn test_division_by_zero_falls_to_double() {
        let inf = Real::int(1) / Real::zero();
        assert!(matches!(inf, Real::Double(d) if d == f64::INFINITY));
        let nan = Real::zero() / Real::zero();
        assert!(nan.is_nan());
    }

    #[test]
    fn test_modulo() {
        assert_eq!(Real::int(7) % Real::int(3), Real::int(1));
        assert_eq!(Real::int(-7) % Real::int(3), Real::int(2));
        assert_eq!(
            Real::rational(7, 2) % Real::int(2),
            Real::rational(3, 2)
        );
    }

    #[test]
    fn test_floor_ceiling_round() {
        let x = Real::rational(-7, 2);
        assert_eq!(x.floor(), Real::int(-4));
        assert_eq!(x.ceiling(), Real::int(-3));
        assert_eq!(Real::rational(5, 2).round(), Real::int(3));
        assert!(matches!(Real::from(2.5).floor(), Real::Double(d) if d == 2.0));
    }

    #[test]
    fn test_comparison_large_values() {
        // Sign comparison avoids the cross multiply; make sure mixed signs
        // and large magnitudes order correctly.
        let big = Real::int(i64::MAX) * Real::int(i64::MAX);
        let small = Real::int(i64::MIN);
        assert!(small < big);
        assert!(big > Real::zero());
        assert!(Real::rational(1, 3) < Real::rational(1, 2));
    }

    #[test]
    fn test_representation_strict_equality() {
        // 1/2 as a rational and 0.5 as a double are numerically equal but
        // not the same value.
        assert_ne!(Real::rational(1, 2), Real::from(0.5));
        assert!(Real::rational(1, 2) < Real::from(0.5));
        assert!(Real::from(0.5) > Real::rational(1, 2));
    }

    #[test]
    fn test_transcendental_always_double() {
        assert!(matches!(Real::zero().sin(), Real::Double(_)));
        assert!(matches!(Real::one().exp(), Real::Double(_)));
        assert_relative_eq!(Real::one().exp().to_f64(), std::f64::consts::E);
    }

    #[test]
    fn test_to_i64() {
        assert_eq!(Real::int(42).to_i64(), Some(42));
        assert_eq!(Real::rational(1, 2).to_i64(), None);
        assert_eq!(Real::from(3.0).to_i64(), Some(3));
        assert_eq!(Real::from(3.5).to_i64(), None);
    }
}
