#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// # Real arithmetic
/// arbitrary precision rational numbers with an explicit floating-point
/// fallback - the numeric ground floor of the whole symbolic engine.
///# Example
/// ```
/// use RustedCAS::symbolic::real_arithmetic::Real;
/// let a = Real::rational(1, 3);
/// let b = Real::rational(1, 6);
/// assert_eq!(a + b, Real::rational(1, 2));
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod real_arithmetic;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// the expression tree itself: atoms, n-ary sums and products kept in
/// canonical form by their constructors, powers and function calls.
/// 1) build expressions with smart constructors or operator overloading
/// 2) canonical form makes equality/hashing structural
/// 3) Display prints the conventional infix notation
///# Example
/// ```
/// use RustedCAS::symbolic::symbolic_engine::Expr;
/// let x = Expr::var("x");
/// let e = (x.clone() + Expr::int(2)) * x;
/// println!("{}", e);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
///________________________________________________________________________________________________________________________________________________
/// pattern matching with a transactional binding context, including the
/// associative-commutative case for sums and products
///# Example
/// ```
/// use RustedCAS::symbolic::symbolic_engine::Expr;
/// let pattern = Expr::var("a") + Expr::var("b");
/// let subject = (Expr::int(1) + Expr::int(2) + Expr::var("x")).evaluate();
/// assert!(pattern.matches(&subject).is_some());
/// ```
pub mod symbolic_match;
/// evaluation, substitution, expansion and the native function registry
pub mod symbolic_evaluate;
/// rewrite rules: single pattern transforms, discrimination tree dispatch,
/// auto-generated algebraic inverses, and a memoizing wrapper
pub mod symbolic_transform;
/// decompose an expanded expression into coefficients over a set of basis
/// expressions - the row type of the nodal equation system
pub mod linear_combination;
/// single-variable polynomials with long division
pub mod polynomial;
///______________________________________________________________________________________________________________________________________________
/// a module turns a String expression into a symbolic expression
/// _____________________________________________________________________________________________________________________________________________
pub mod parse_expr;
/// the collection of small utility functions shared across the engine
pub mod utils;
#[cfg(test)]
pub mod symbolic_engine_tests;
