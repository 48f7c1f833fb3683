//! End to end scenarios through the full pipeline.
use std::collections::BTreeMap;

use satori::pipeline::{solve_cnf, solve_expr, SolveOptions, SolveOutcome, SolverKind};
use satori_formula::{cnf_formula, CnfFormula, Lit, UnsatReason};
use satori_prefix::parse_str;

fn solve_prefix(input: &str) -> SolveOutcome {
    let expr = parse_str(input).unwrap();
    solve_expr(&expr, &SolveOptions::default()).unwrap()
}

/// Solve with every combination of backend and stage toggles.
fn solve_prefix_matrix(input: &str) -> Vec<SolveOutcome> {
    let expr = parse_str(input).unwrap();
    let mut outcomes = vec![];
    for &solver in &[SolverKind::Cdcl, SolverKind::Brute] {
        for &ast_optimization in &[true, false] {
            for &cnf_simplification in &[true, false] {
                let options = SolveOptions {
                    solver,
                    ast_optimization,
                    cnf_simplification,
                    ..SolveOptions::default()
                };
                outcomes.push(solve_expr(&expr, &options).unwrap());
            }
        }
    }
    outcomes
}

fn model(outcome: &SolveOutcome) -> &BTreeMap<String, bool> {
    outcome.model().expect("expected a satisfiable outcome")
}

#[test]
fn single_variable() {
    let outcome = solve_prefix(r#"Var "x""#);
    assert_eq!(model(&outcome).get("x"), Some(&true));

    for outcome in solve_prefix_matrix(r#"Var "x""#) {
        assert!(outcome.is_sat());
    }
}

#[test]
fn variable_and_its_negation() {
    for outcome in solve_prefix_matrix(r#"And (Var "x") (Not (Var "x"))"#) {
        assert!(!outcome.is_sat());
    }
}

#[test]
fn excluded_middle() {
    let outcome = solve_prefix(r#"Or (Var "x") (Not (Var "x"))"#);
    assert!(outcome.is_sat());
    assert!(model(&outcome).contains_key("x"));

    for outcome in solve_prefix_matrix(r#"Or (Var "x") (Not (Var "x"))"#) {
        assert!(outcome.is_sat());
    }
}

#[test]
fn forced_two_variable_model() {
    let input = r#"
        And (Or (Var "a") (Var "b"))
            (And (Or (Not (Var "a")) (Var "b"))
                 (Or (Var "a") (Not (Var "b"))))
    "#;
    let outcome = solve_prefix(input);
    let model = model(&outcome);
    assert_eq!(model.get("a"), Some(&true));
    assert_eq!(model.get("b"), Some(&true));

    for outcome in solve_prefix_matrix(input) {
        assert!(outcome.is_sat());
    }
}

#[test]
fn all_two_variable_clauses() {
    let input = r#"
        And (Or (Var "a") (Var "b"))
            (And (Or (Not (Var "a")) (Var "b"))
                 (And (Or (Var "a") (Not (Var "b")))
                      (Or (Not (Var "a")) (Not (Var "b")))))
    "#;
    for outcome in solve_prefix_matrix(input) {
        assert!(!outcome.is_sat());
    }
}

#[test]
fn iff_with_own_negation() {
    for outcome in solve_prefix_matrix(r#"Iff (Var "x") (Not (Var "x"))"#) {
        assert!(!outcome.is_sat());
    }
}

#[test]
fn constants() {
    assert!(solve_prefix("T").is_sat());
    assert!(!solve_prefix("F").is_sat());
    assert!(solve_prefix(r#"Implies F (Var "x")"#).is_sat());
}

#[test]
fn dimacs_single_unit() {
    let cnf = cnf_formula![
        1;
    ];
    let outcome = solve_cnf(cnf, &SolveOptions::default()).unwrap();
    assert_eq!(model(&outcome).get("1"), Some(&true));
}

#[test]
fn dimacs_contradicting_units() {
    let cnf = cnf_formula![
        1;
        -1;
    ];
    let outcome = solve_cnf(cnf, &SolveOptions::default()).unwrap();
    match outcome {
        SolveOutcome::Unsat(reason) => {
            assert_eq!(reason.root(), &UnsatReason::UnitPropagation)
        }
        SolveOutcome::Sat(_) => panic!("expected UNSAT"),
    }
}

#[test]
fn empty_formula_is_sat() {
    let outcome = solve_cnf(CnfFormula::new(), &SolveOptions::default()).unwrap();
    assert_eq!(model(&outcome).len(), 0);
}

#[test]
fn empty_clause_is_unsat_by_normalization() {
    let mut cnf = CnfFormula::new();
    cnf.add_clause(Vec::<Lit>::new());
    let outcome = solve_cnf(cnf, &SolveOptions::default()).unwrap();
    match outcome {
        SolveOutcome::Unsat(reason) => {
            assert_eq!(reason.root(), &UnsatReason::CnfNormalization)
        }
        SolveOutcome::Sat(_) => panic!("expected UNSAT"),
    }
}

#[test]
fn unit_without_simplification_solves_in_the_engine() {
    let cnf = cnf_formula![
        1;
        -1, 2;
    ];
    let options = SolveOptions {
        cnf_simplification: false,
        ..SolveOptions::default()
    };
    let outcome = solve_cnf(cnf, &options).unwrap();
    let model = model(&outcome);
    assert_eq!(model.get("1"), Some(&true));
    assert_eq!(model.get("2"), Some(&true));
}

#[test]
fn expected_result_hook_roundtrip() {
    let expr = parse_str(r#"And (Var "x") (Var "y")"#).unwrap();
    let options = SolveOptions {
        expected_result: Some(true),
        ..SolveOptions::default()
    };
    assert!(solve_expr(&expr, &options).unwrap().is_sat());

    let options = SolveOptions {
        expected_result: Some(false),
        ..SolveOptions::default()
    };
    assert!(solve_expr(&expr, &options).is_err());
}

#[test]
fn backends_agree_on_small_formulas() {
    let inputs = [
        r#"Implies (And (Var "a") (Var "b")) (Or (Var "a") (Var "c"))"#,
        r#"Iff (Var "a") (Iff (Var "b") (Var "c"))"#,
        r#"Not (Implies (Var "p") (Var "p"))"#,
        r#"And (Iff (Var "p") (Var "q")) (And (Var "p") (Not (Var "q")))"#,
    ];
    for input in &inputs {
        let expr = parse_str(input).unwrap();
        let cdcl = solve_expr(&expr, &SolveOptions::default()).unwrap();
        let brute = solve_expr(
            &expr,
            &SolveOptions {
                solver: SolverKind::Brute,
                ..SolveOptions::default()
            },
        )
        .unwrap();
        assert_eq!(cdcl.is_sat(), brute.is_sat(), "disagreement on {}", input);
    }
}
