//! # Linear Combination Module
//!
//! Decompose an expanded expression into a linear combination of basis
//! expressions: an ordered list of (basis, coefficient) columns plus one
//! trailing implicit constant column. This is the row type the circuit
//! solver's Gaussian elimination works on: `scale` and `add_scaled` are the
//! elementary row operations, `pivot` drives the elimination ordering and
//! `solve_for` back-substitutes one unknown.

use crate::symbolic::symbolic_engine::Expr;
use itertools::Itertools;
use std::fmt;

/// An expression decomposed into coefficients over a set of basis
/// expressions, plus a constant part.
#[derive(Debug, Clone)]
pub struct LinearCombination {
    // (basis, coefficient) columns; the last column is always the implicit
    // constant basis 1.
    terms: Vec<(Expr, Expr)>,
}

impl LinearCombination {
    /// Create a new empty linear combination over `basis`.
    pub fn new(basis: &[Expr]) -> LinearCombination {
        let mut terms: Vec<(Expr, Expr)> = basis
            .iter()
            .map(|b| (b.clone(), Expr::zero()))
            .collect();
        terms.push((Expr::one(), Expr::zero()));
        LinearCombination { terms }
    }

    /// Decompose `e`: expand it, then for each additive term try dividing by
    /// each basis expression in turn; a quotient free of every basis
    /// expression accumulates as that basis's coefficient, anything else
    /// accumulates into the constant column.
    pub fn from_expression(basis: &[Expr], e: &Expr) -> LinearCombination {
        let mut lc = LinearCombination::new(basis);
        let expanded = e.expand();
        for t in expanded.sum_terms() {
            lc.add_term(basis, t);
        }
        lc
    }

    fn add_term(&mut self, basis: &[Expr], t: &Expr) {
        if t.depends_on(basis) {
            for b in basis {
                let tb = (t.clone() / b.clone()).evaluate();
                if !tb.depends_on(basis) {
                    self.accumulate(&b.clone(), tb);
                    return;
                }
            }
        }
        self.accumulate(&Expr::one(), t.clone());
    }

    fn accumulate(&mut self, b: &Expr, value: Expr) {
        if let Some((_, coeff)) = self.terms.iter_mut().find(|(basis, _)| basis == b) {
            *coeff = (coeff.clone() + value).evaluate();
        }
    }

    /// Basis expressions of this linear combination, the constant column
    /// last.
    pub fn basis(&self) -> impl Iterator<Item = &Expr> {
        self.terms.iter().map(|(b, _)| b)
    }

    /// The coefficient of basis expression `b`, if `b` is a column.
    pub fn coefficient(&self, b: &Expr) -> Option<&Expr> {
        self.terms
            .iter()
            .find(|(basis, _)| basis == b)
            .map(|(_, coeff)| coeff)
    }

    /// The coefficient of the implicit constant column.
    pub fn constant(&self) -> &Expr {
        // The constant column always exists, by construction.
        &self.terms[self.terms.len() - 1].1
    }

    pub fn set_coefficient(&mut self, b: &Expr, value: Expr) -> Result<(), String> {
        match self.terms.iter_mut().find(|(basis, _)| basis == b) {
            Some((_, coeff)) => {
                *coeff = value;
                Ok(())
            }
            None => Err(format!(
                "'{}' is not a basis expression of this linear combination",
                b
            )),
        }
    }

    // coefficient * basis, with the trivial cases collapsed.
    fn column_product(b: &Expr, coeff: &Expr) -> Expr {
        if b.is_one() {
            coeff.clone()
        } else if coeff.is_zero() {
            Expr::zero()
        } else {
            Expr::product(vec![coeff.clone(), b.clone()])
        }
    }

    /// Reconstruct the plain expression this linear combination stands for.
    pub fn to_expression(&self) -> Expr {
        Expr::sum(
            self.terms
                .iter()
                .map(|(b, coeff)| Self::column_product(b, coeff))
                .filter(|t| !t.is_zero())
                .collect(),
        )
    }

    /// The pivot: the first column with a nonzero coefficient and a
    /// non-constant basis.
    pub fn pivot(&self) -> Option<(&Expr, &Expr)> {
        self.terms
            .iter()
            .find(|(b, coeff)| !coeff.is_zero() && !b.is_one())
            .map(|(b, coeff)| (b, coeff))
    }

    /// Column index of the first nonzero coefficient.
    pub fn pivot_position(&self) -> Option<usize> {
        self.terms.iter().position(|(_, coeff)| !coeff.is_zero())
    }

    /// Solve `this = 0` for the basis expression `v`: negate the sum of all
    /// other columns and divide by v's coefficient.
    pub fn solve_for(&self, v: &Expr) -> Result<Expr, String> {
        let coeff = self.coefficient(v).ok_or_else(|| {
            format!(
                "'{}' is not a basis expression of this linear combination",
                v
            )
        })?;
        if coeff.is_zero() {
            return Err(format!("cannot solve for '{}': its coefficient is zero", v));
        }
        let rest = Expr::sum(
            self.terms
                .iter()
                .filter(|(b, _)| b != v)
                .map(|(b, coeff)| Self::column_product(b, coeff))
                .collect(),
        );
        Ok((rest / (-coeff.clone())).evaluate())
    }

    /// Solve for the pivot column.
    pub fn solve_for_pivot(&self) -> Result<Expr, String> {
        match self.pivot() {
            Some((b, _)) => self.solve_for(&b.clone()),
            None => Err("linear combination has no pivot".to_string()),
        }
    }

    /// Multiply every coefficient by `k`.
    pub fn scale(&mut self, k: &Expr) {
        for (_, coeff) in self.terms.iter_mut() {
            *coeff = (coeff.clone() * k.clone()).evaluate();
        }
    }

    /// Add `k` times the coefficients of `other` into this one - the
    /// elementary row operation of Gaussian elimination. The columns of
    /// `other` must cover this combination's basis.
    pub fn add_scaled(&mut self, k: &Expr, other: &LinearCombination) -> Result<(), String> {
        let mut updated = Vec::with_capacity(self.terms.len());
        for (b, coeff) in &self.terms {
            let other_coeff = other.coefficient(b).ok_or_else(|| {
                format!("'{}' is not a basis expression of the other combination", b)
            })?;
            updated.push((
                b.clone(),
                (coeff.clone() + other_coeff.clone() * k.clone()).evaluate(),
            ));
        }
        self.terms = updated;
        Ok(())
    }

    /// Reorder the basis columns (for pivoting strategies). `new_basis` must
    /// be a permutation of the non-constant columns; the constant column
    /// stays last.
    pub fn swap_columns(&mut self, new_basis: &[Expr]) -> Result<(), String> {
        if new_basis.len() + 1 != self.terms.len() {
            return Err(format!(
                "new basis has {} columns, expected {}",
                new_basis.len(),
                self.terms.len() - 1
            ));
        }
        let mut reordered = Vec::with_capacity(self.terms.len());
        for b in new_basis {
            match self.terms.iter().find(|(basis, _)| basis == b) {
                Some(column) => reordered.push(column.clone()),
                None => {
                    return Err(format!(
                        "'{}' is not a basis expression of this linear combination",
                        b
                    ));
                }
            }
        }
        if let Some(constant) = self.terms.iter().find(|(b, _)| b.is_one()) {
            reordered.push(constant.clone());
        }
        self.terms = reordered;
        Ok(())
    }
}

impl fmt::Display for LinearCombination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rendered = self
            .terms
            .iter()
            .map(|(b, coeff)| Self::column_product(b, coeff))
            .filter(|t| !t.is_zero())
            .map(|t| t.to_string())
            .join(" + ");
        if rendered.is_empty() {
            write!(f, "0")
        } else {
            write!(f, "{}", rendered)
        }
    }
}
