//___________________________________END TO END TESTS____________________________________
//
// Property and end-to-end tests spanning the whole engine: canonical form,
// matching soundness, the AC search, transforms and the decomposition
// utilities working together.

use crate::symbolic::linear_combination::LinearCombination;
use crate::symbolic::polynomial::Polynomial;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_transform::{PatternTransform, Transform, TransformSet};
use itertools::Itertools;
use rand::Rng;

fn x() -> Expr {
    Expr::var("x")
}

#[test]
fn test_canonicalization_is_idempotent() {
    let cases = vec![
        Expr::sum(vec![Expr::var("y"), Expr::int(3), Expr::var("x")]),
        Expr::product(vec![Expr::var("b"), Expr::var("a"), Expr::int(2)]),
        Expr::sum(vec![
            Expr::call("Sin", vec![x()]),
            x().pow(Expr::int(2)),
            Expr::var("y"),
        ]),
    ];
    for e in cases {
        let again = match &e {
            Expr::Sum(terms) => Expr::sum(terms.clone()),
            Expr::Product(terms) => Expr::product(terms.clone()),
            other => other.clone(),
        };
        assert_eq!(again, e);
    }
}

#[test]
fn test_canonicalization_is_order_invariant() {
    let terms = vec![
        Expr::var("y"),
        Expr::int(3),
        x().pow(Expr::int(2)),
        Expr::call("Sin", vec![x()]),
    ];
    let reference = Expr::sum(terms.clone());
    for permutation in terms.iter().cloned().permutations(terms.len()) {
        assert_eq!(Expr::sum(permutation), reference);
    }
    let reference = Expr::product(terms.clone());
    for permutation in terms.iter().cloned().permutations(terms.len()) {
        assert_eq!(Expr::product(permutation), reference);
    }
}

#[test]
fn test_matching_soundness() {
    // If pattern.matches(subject) succeeds, substituting the bindings into
    // the pattern evaluates to an expression equal to the subject.
    let a = Expr::var("a");
    let b = Expr::var("b");
    let cases = vec![
        (
            Expr::sum(vec![a.clone(), b.clone()]),
            (x() + Expr::var("y") + Expr::int(3)).evaluate(),
        ),
        (
            Expr::product(vec![a.clone(), b.clone()]),
            (Expr::int(2) * x() * Expr::var("y")).evaluate(),
        ),
        (
            a.clone().pow(b.clone()),
            x().pow(Expr::int(2)),
        ),
        (
            Expr::call("Sin", vec![a.clone()]),
            Expr::call("Sin", vec![(x() + Expr::int(1)).evaluate()]),
        ),
    ];
    for (pattern, subject) in cases {
        let ctx = pattern
            .matches(&subject)
            .unwrap_or_else(|| panic!("{} failed to match {}", pattern, subject));
        let substituted = pattern.substitute(&ctx.substitution()).evaluate();
        assert_eq!(substituted, subject.evaluate(), "pattern {}", pattern);
    }
}

#[test]
fn test_ac_completeness_small_case() {
    // a + b against the three-term subject 1 + 2 + 3: some nontrivial
    // two-way partition must be found.
    let pattern = Expr::sum(vec![Expr::var("a"), Expr::var("b")]);
    let subject = Expr::sum(vec![Expr::int(1), Expr::int(2), Expr::int(3)]);
    let ctx = pattern.matches(&subject).unwrap();
    let a = ctx.matched("a").unwrap().clone();
    let b = ctx.matched("b").unwrap().clone();
    assert!(!a.is_zero() && !b.is_zero(), "partition must be nontrivial");
    assert_eq!((a + b).evaluate(), Expr::int(6));
}

#[test]
fn test_parse_and_evaluate() {
    let e = Expr::parse_expression("2+3*4").unwrap();
    assert_eq!(e.evaluate(), Expr::int(14));
}

#[test]
fn test_pythagorean_transform() {
    // {Sin[x]^2 + Cos[x]^2 -> 1} rewrites Sin[y]^2 + Cos[y]^2 to 1.
    let pattern = Expr::parse_expression("Sin[x]^2 + Cos[x]^2").unwrap();
    let mut set = TransformSet::new();
    set.add(PatternTransform::new(pattern, Expr::one(), vec![]));

    let subject = Expr::parse_expression("Sin[y]^2 + Cos[y]^2").unwrap();
    assert_eq!(set.transform(&subject), Expr::one());

    // A subject with mismatched arguments is left unchanged.
    let mismatched = Expr::parse_expression("Sin[y]^2 + Cos[z]^2").unwrap();
    assert_eq!(set.transform(&mismatched), mismatched);
}

#[test]
fn test_linear_combination_end_to_end() {
    let e = Expr::parse_expression("3*x + 2*y + 5").unwrap();
    let basis = vec![Expr::var("x"), Expr::var("y")];
    let lc = LinearCombination::from_expression(&basis, &e);
    assert_eq!(lc.coefficient(&Expr::var("x")), Some(&Expr::int(3)));
    assert_eq!(lc.coefficient(&Expr::var("y")), Some(&Expr::int(2)));
    assert_eq!(lc.constant(), &Expr::int(5));
}

#[test]
fn test_polynomial_round_trip() {
    let e = Expr::parse_expression("3*x^2 + 2*x + 1").unwrap().evaluate();
    let p = Polynomial::from_expression(&e, &x()).unwrap();
    assert_eq!(p.to_expression().evaluate(), e);
}

fn random_polynomial(rng: &mut impl Rng, degree: i64) -> Polynomial {
    let mut e = Expr::zero();
    for d in 0..degree {
        let c: i64 = rng.random_range(-5..=5);
        e = e + Expr::int(c) * x().pow(Expr::int(d));
    }
    // Nonzero leading coefficient.
    let sign: i64 = if rng.random_range(0..2) == 0 { 1 } else { -1 };
    let lead: i64 = sign * rng.random_range(1..=5);
    e = e + Expr::int(lead) * x().pow(Expr::int(degree));
    Polynomial::from_expression(&e.evaluate(), &x()).expect("generated a polynomial")
}

#[test]
fn test_long_division_identity_randomized() {
    // N == D*Q + R for random small-integer-coefficient polynomials.
    let mut rng = rand::rng();
    for _ in 0..50 {
        let divisor_degree = rng.random_range(0..=2);
        let numerator_degree = rng.random_range(divisor_degree..=4);
        let n = random_polynomial(&mut rng, numerator_degree);
        let d = random_polynomial(&mut rng, divisor_degree);

        let (q, r) = Polynomial::long_division(&n, &d).unwrap();
        if let (Some(rd), Some(dd)) = (r.degree(), d.degree()) {
            assert!(rd < dd, "remainder degree {} >= divisor degree {}", rd, dd);
        }

        let recombined = d.to_expression() * q.to_expression() + r.to_expression();
        let difference = (recombined - n.to_expression()).expand().evaluate();
        assert!(
            difference.is_zero(),
            "N != D*Q + R: difference {}",
            difference
        );
    }
}

#[test]
fn test_expand_then_decompose() {
    // The nodal-analysis workflow: expand a branch equation, decompose it
    // over the unknowns, solve for the pivot.
    let e = Expr::parse_expression("(x + 2)*(y + 3) - x*y").unwrap();
    let basis = vec![Expr::var("x"), Expr::var("y")];
    let lc = LinearCombination::from_expression(&basis, &e);
    // (x+2)*(y+3) - x*y = 3*x + 2*y + 6.
    assert_eq!(lc.coefficient(&Expr::var("x")), Some(&Expr::int(3)));
    assert_eq!(lc.coefficient(&Expr::var("y")), Some(&Expr::int(2)));
    assert_eq!(lc.constant(), &Expr::int(6));

    let (pivot, _) = lc.pivot().unwrap();
    assert_eq!(pivot, &Expr::var("x"));
    let solved = lc.solve_for_pivot().unwrap();
    let expected = Expr::parse_expression("(2*y + 6)/(-3)").unwrap().evaluate();
    assert_eq!(solved, expected);
}

#[test]
fn test_evaluated_expressions_stay_canonical() {
    // Matching and rewriting assume evaluated inputs remain canonical:
    // re-canonicalizing an evaluated sum changes nothing.
    let e = Expr::parse_expression("2*x + y*y + Sin[x] + x*2").unwrap().evaluate();
    if let Expr::Sum(terms) = &e {
        assert_eq!(Expr::sum(terms.clone()), e);
    } else {
        panic!("expected an evaluated sum, got {}", e);
    }
}
