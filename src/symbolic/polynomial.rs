//! # Polynomial Module
//!
//! Single-variable polynomials extracted from expressions: a variable plus a
//! degree -> coefficient map. Extraction is strict - every additive term must
//! fit the shape (coefficient free of the variable) * variable^(integer
//! degree), and anything else is an explicit algebra error, not a silent
//! default. A zero coefficient is never stored: the setter deletes the entry
//! instead, so the map's keys are exactly the populated degrees.

use crate::symbolic::symbolic_engine::Expr;
use std::collections::BTreeMap;
use std::fmt;
use std::slice;

/// A polynomial of one variable with expression coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    coefficients: BTreeMap<i64, Expr>,
    variable: Expr,
}

// Decompose one additive term into (degree, coefficient), or None if the
// term is not `coefficient * x^n` with an integer n and a coefficient free
// of x.
fn decompose_term(term: &Expr, x: &Expr) -> Option<(i64, Expr)> {
    let mut degree: i64 = 0;
    let mut coeff_factors: Vec<Expr> = Vec::new();
    for factor in term.product_terms() {
        if factor == x {
            degree += 1;
        } else if let Expr::Pow(base, exp) = factor {
            if base.as_ref() == x {
                match exp.as_real().and_then(|c| c.to_i64()) {
                    Some(n) => degree += n,
                    None => return None,
                }
            } else if factor.depends_on(slice::from_ref(x)) {
                return None;
            } else {
                coeff_factors.push(factor.clone());
            }
        } else if factor.depends_on(slice::from_ref(x)) {
            return None;
        } else {
            coeff_factors.push(factor.clone());
        }
    }
    Some((degree, Expr::product(coeff_factors)))
}

impl Polynomial {
    /// Construct a polynomial of `x` from `f`.
    ///
    /// # Returns
    /// Err if any additive term of `f` does not fit
    /// `coefficient * x^integer_degree`.
    pub fn from_expression(f: &Expr, x: &Expr) -> Result<Polynomial, String> {
        let mut p = Polynomial {
            coefficients: BTreeMap::new(),
            variable: x.clone(),
        };
        for term in f.sum_terms() {
            match decompose_term(term, x) {
                Some((degree, coeff)) => {
                    let updated = (p.coefficient(degree) + coeff).evaluate();
                    p.set_coefficient(degree, updated);
                }
                None => {
                    return Err(format!("'{}' is not a polynomial of '{}'", f, x));
                }
            }
        }
        Ok(p)
    }

    pub fn variable(&self) -> &Expr {
        &self.variable
    }

    /// The coefficient of `x^degree`; a missing degree reads as zero.
    pub fn coefficient(&self, degree: i64) -> Expr {
        self.coefficients
            .get(&degree)
            .cloned()
            .unwrap_or_else(Expr::zero)
    }

    /// Set the coefficient of `x^degree`. Setting a coefficient to zero
    /// deletes the entry.
    pub fn set_coefficient(&mut self, degree: i64, value: Expr) {
        if value.is_zero() {
            self.coefficients.remove(&degree);
        } else {
            self.coefficients.insert(degree, value);
        }
    }

    /// The populated (degree, coefficient) pairs, in ascending degree order.
    pub fn coefficients(&self) -> impl Iterator<Item = (&i64, &Expr)> {
        self.coefficients.iter()
    }

    /// The degree of the polynomial: the maximum populated degree, or None
    /// for the zero polynomial.
    pub fn degree(&self) -> Option<i64> {
        self.coefficients.keys().next_back().copied()
    }

    /// The degree, or `default` for the zero polynomial.
    pub fn degree_or(&self, default: i64) -> i64 {
        self.degree().unwrap_or(default)
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Reconstruct the plain expression this polynomial stands for.
    pub fn to_expression(&self) -> Expr {
        Expr::sum(
            self.coefficients
                .iter()
                .map(|(degree, coeff)| match degree {
                    0 => coeff.clone(),
                    1 => Expr::product(vec![coeff.clone(), self.variable.clone()]),
                    d => Expr::product(vec![
                        coeff.clone(),
                        self.variable.clone().pow(Expr::int(*d)),
                    ]),
                })
                .collect(),
        )
    }

    /// Polynomial long division: `n = d*quotient + remainder` with the
    /// remainder's degree below the divisor's.
    ///
    /// # Returns
    /// `(quotient, remainder)`, or an error for a variable mismatch or a
    /// zero divisor.
    pub fn long_division(n: &Polynomial, d: &Polynomial) -> Result<(Polynomial, Polynomial), String> {
        if n.variable != d.variable {
            return Err(format!(
                "dividing polynomials of different variables '{}' and '{}'",
                n.variable, d.variable
            ));
        }
        let divisor_degree = match d.degree() {
            Some(degree) => degree,
            None => return Err("division by the zero polynomial".to_string()),
        };
        let lead_divisor = d.coefficient(divisor_degree);

        let mut quotient = Polynomial {
            coefficients: BTreeMap::new(),
            variable: n.variable.clone(),
        };
        let mut remainder = n.clone();

        while let Some(remainder_degree) = remainder.degree() {
            if remainder_degree < divisor_degree {
                break;
            }
            let t = (remainder.coefficient(remainder_degree) / lead_divisor.clone()).evaluate();
            let offset = remainder_degree - divisor_degree;

            let q = (quotient.coefficient(offset) + t.clone()).evaluate();
            quotient.set_coefficient(offset, q);

            for (i, ci) in d.coefficients.iter() {
                let key = i + offset;
                let updated = (remainder.coefficient(key) - ci.clone() * t.clone()).evaluate();
                remainder.set_coefficient(key, updated);
            }

            // The leading term cancels exactly by construction; if the
            // coefficient arithmetic failed to reduce it, bail out rather
            // than loop forever.
            if remainder.coefficients.contains_key(&remainder_degree) {
                return Err(format!(
                    "leading coefficient '{}' did not cancel during long division",
                    remainder.coefficient(remainder_degree)
                ));
            }
        }

        Ok((quotient, remainder))
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_expression())
    }
}
