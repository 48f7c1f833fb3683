//! The formula solving pipeline.
//!
//! Stages: negation-normal optimization of the input formula, Tseitin CNF
//! conversion, CNF simplification, and finally the CDCL engine or the brute
//! force baseline. A stage that decides UNSAT wraps its formula into a
//! short-circuit marker which the remaining stages pass through untouched.
use std::collections::BTreeMap;

use anyhow::{bail, Error};
use log::{debug, info};

use satori_formula::{CnfFormula, Expr, FormulaRepr, Nwf, SatFormula, UnsatReason, VarMap};

use crate::checker;
use crate::config::SolverConfigUpdate;
use crate::model::founder_model;
use crate::preprocess;
use crate::solver::Solver;
use crate::tseitin;

/// Which solving backend to use.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolverKind {
    Cdcl,
    Brute,
}

/// Pipeline configuration.
pub struct SolveOptions {
    pub solver: SolverKind,
    /// Optimize the formula tree before CNF conversion.
    pub ast_optimization: bool,
    /// Convert to CNF; disabling this restricts solving to the brute force
    /// backend.
    pub cnf_conversion: bool,
    /// Simplify the CNF before solving.
    pub cnf_simplification: bool,
    /// Expected result; a mismatch aborts with an error, and the simplified
    /// formula is additionally cross-checked by enumeration when feasible.
    pub expected_result: Option<bool>,
    /// Solver parameter overrides.
    pub config: SolverConfigUpdate,
}

impl Default for SolveOptions {
    fn default() -> SolveOptions {
        SolveOptions {
            solver: SolverKind::Cdcl,
            ast_optimization: true,
            cnf_conversion: true,
            cnf_simplification: true,
            expected_result: None,
            config: SolverConfigUpdate::new(),
        }
    }
}

/// The answer of a solve run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Satisfiable, with a satisfying assignment over the founder
    /// variables.
    Sat(BTreeMap<String, bool>),
    /// Unsatisfiable, with the reason of whichever stage decided it.
    Unsat(UnsatReason),
}

impl SolveOutcome {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolveOutcome::Sat(_))
    }

    /// The model, for satisfiable outcomes.
    pub fn model(&self) -> Option<&BTreeMap<String, bool>> {
        match self {
            SolveOutcome::Sat(model) => Some(model),
            SolveOutcome::Unsat(_) => None,
        }
    }

    /// The one-character answer used on stdout: `1` for SAT, `0` for UNSAT.
    pub fn answer(&self) -> &'static str {
        if self.is_sat() {
            "1"
        } else {
            "0"
        }
    }
}

/// Solve a free-form formula.
pub fn solve_expr(expr: &Expr, options: &SolveOptions) -> Result<SolveOutcome, Error> {
    let formula = prepare_expr(expr, options);
    finish(formula, options)
}

/// Solve a ready-made CNF formula, e.g. from DIMACS input.
///
/// Every variable of the formula is a founder, named by its 1-based index.
pub fn solve_cnf(cnf: CnfFormula, options: &SolveOptions) -> Result<SolveOutcome, Error> {
    let mut vars = VarMap::new();
    for index in 0..cnf.var_count() {
        vars.intern(&(index + 1).to_string());
    }
    let formula = tseitin::normalize_cnf(cnf, vars);
    finish(formula, options)
}

/// Run the front of the pipeline: tree optimization and CNF conversion.
///
/// Exposed separately so hosts can inspect or dump the converted CNF.
pub fn prepare_expr(expr: &Expr, options: &SolveOptions) -> SatFormula {
    if options.ast_optimization {
        let mut vars = VarMap::new();
        let nwf = Nwf::from_expr(expr, &mut vars).optimize();
        debug!("optimized formula: {}", nwf.measure());

        if options.cnf_conversion {
            let optimized = nwf.to_expr(&vars);
            tseitin::to_cnf(&optimized)
        } else {
            SatFormula::new(FormulaRepr::Nwf(nwf), vars)
        }
    } else if options.cnf_conversion {
        tseitin::to_cnf(expr)
    } else {
        let mut vars = VarMap::new();
        let nwf = Nwf::from_expr(expr, &mut vars);
        SatFormula::new(FormulaRepr::Nwf(nwf), vars)
    }
}

/// Run the back of the pipeline: simplification and solving.
fn finish(mut formula: SatFormula, options: &SolveOptions) -> Result<SolveOutcome, Error> {
    info!("formula: {}", formula.brief());

    if let Some(reason) = formula.unsat_reason() {
        let outcome = SolveOutcome::Unsat(reason.clone());
        check_expectation(&outcome, &formula, options)?;
        return Ok(outcome);
    }

    if options.cnf_simplification && matches!(formula.repr(), FormulaRepr::Cnf(_)) {
        let (repr, vars, _) = formula.into_parts();
        let cnf = match repr {
            FormulaRepr::Cnf(cnf) => cnf,
            _ => unreachable!(),
        };
        match preprocess::simplify(&cnf, &vars) {
            Ok(simplified) => {
                formula = SatFormula::new(FormulaRepr::Cnf(simplified), vars);
                info!("simplified formula: {}", formula.brief());
            }
            Err(reason) => {
                let outcome = SolveOutcome::Unsat(reason.clone());
                let shortcut = SatFormula::shortcut(FormulaRepr::Cnf(cnf), vars, reason);
                check_expectation(&outcome, &shortcut, options)?;
                return Ok(outcome);
            }
        }
    }

    let outcome = match formula.repr() {
        FormulaRepr::Cnf(cnf) => match options.solver {
            SolverKind::Cdcl => {
                let mut solver = Solver::new();
                solver.config(&options.config);
                solver.add_formula(cnf);
                if solver.solve() {
                    let model = solver.model().expect("satisfiable solver has a model");
                    let assignment = model.iter().map(|lit| (lit.var(), lit.is_positive()));
                    let mut founders = founder_model(formula.vars(), assignment);
                    complete_founders(&mut founders, formula.vars());
                    SolveOutcome::Sat(founders)
                } else {
                    SolveOutcome::Unsat(UnsatReason::CdclConflict)
                }
            }
            SolverKind::Brute => match checker::solve_cnf(cnf)? {
                Some(assignment) => {
                    let mut founders = founder_model(formula.vars(), assignment);
                    complete_founders(&mut founders, formula.vars());
                    SolveOutcome::Sat(founders)
                }
                None => SolveOutcome::Unsat(UnsatReason::Exhausted),
            },
        },
        FormulaRepr::Nwf(nwf) => match options.solver {
            SolverKind::Brute => match checker::solve_nwf(nwf, formula.vars())? {
                Some(assignment) => {
                    let mut founders = founder_model(formula.vars(), assignment);
                    complete_founders(&mut founders, formula.vars());
                    SolveOutcome::Sat(founders)
                }
                None => SolveOutcome::Unsat(UnsatReason::Exhausted),
            },
            SolverKind::Cdcl => {
                bail!("the CDCL solver needs CNF conversion enabled")
            }
        },
        FormulaRepr::Expr(_) => bail!("cannot solve a free-form formula directly"),
    };

    check_expectation(&outcome, &formula, options)?;

    Ok(outcome)
}

/// Give founder variables the solver never saw a value.
///
/// Variables eliminated before solving are unconstrained; they default to
/// true, matching the engine's positive decision bias.
fn complete_founders(model: &mut BTreeMap<String, bool>, vars: &VarMap) {
    for (_, name) in vars.founders() {
        model.entry(name.to_owned()).or_insert(true);
    }
}

/// Assert an expected result, cross-checking with the baseline enumerator.
fn check_expectation(
    outcome: &SolveOutcome,
    formula: &SatFormula,
    options: &SolveOptions,
) -> Result<(), Error> {
    let expected = match options.expected_result {
        Some(expected) => expected,
        None => return Ok(()),
    };

    if outcome.is_sat() != expected {
        bail!(
            "self-verification failed: expected {} but the solver answered {}",
            if expected { "SAT" } else { "UNSAT" },
            outcome.answer()
        );
    }

    // Re-solve the formula with the independent baseline where feasible.
    if formula.unsat_reason().is_none() {
        if let FormulaRepr::Cnf(cnf) = formula.repr() {
            if let Ok(baseline) = checker::solve_cnf(cnf) {
                if baseline.is_some() != outcome.is_sat() {
                    bail!("self-verification failed: baseline enumeration disagrees");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use satori_formula::Expr;

    fn solve(expr: &Expr) -> SolveOutcome {
        solve_expr(expr, &SolveOptions::default()).unwrap()
    }

    #[test]
    fn single_variable_is_sat_true() {
        let outcome = solve(&Expr::var("x"));
        let model = outcome.model().unwrap();
        assert_eq!(model.get("x"), Some(&true));
    }

    #[test]
    fn contradiction_is_unsat() {
        let outcome = solve(&Expr::and(Expr::var("x"), Expr::not(Expr::var("x"))));
        assert!(!outcome.is_sat());
    }

    #[test]
    fn excluded_middle_is_sat() {
        let outcome = solve(&Expr::or(Expr::var("x"), Expr::not(Expr::var("x"))));
        assert!(outcome.is_sat());
        assert!(outcome.model().unwrap().contains_key("x"));
    }

    #[test]
    fn brute_force_agrees() {
        let formula = Expr::iff(
            Expr::implies(Expr::var("a"), Expr::var("b")),
            Expr::var("c"),
        );
        let cdcl = solve_expr(&formula, &SolveOptions::default()).unwrap();
        let brute = solve_expr(
            &formula,
            &SolveOptions {
                solver: SolverKind::Brute,
                ..SolveOptions::default()
            },
        )
        .unwrap();
        assert_eq!(cdcl.is_sat(), brute.is_sat());
        assert!(cdcl.is_sat());
    }

    #[test]
    fn expectation_mismatch_is_an_error() {
        let options = SolveOptions {
            expected_result: Some(false),
            ..SolveOptions::default()
        };
        assert!(solve_expr(&Expr::var("x"), &options).is_err());
    }

    #[test]
    fn expectation_match_passes() {
        let options = SolveOptions {
            expected_result: Some(true),
            ..SolveOptions::default()
        };
        assert!(solve_expr(&Expr::var("x"), &options).is_ok());
    }

    #[test]
    fn nwf_brute_force_without_conversion() {
        let options = SolveOptions {
            solver: SolverKind::Brute,
            cnf_conversion: false,
            ..SolveOptions::default()
        };
        let outcome = solve_expr(
            &Expr::and(Expr::var("x"), Expr::not(Expr::var("y"))),
            &options,
        )
        .unwrap();
        let model = outcome.model().unwrap();
        assert_eq!(model.get("x"), Some(&true));
        assert_eq!(model.get("y"), Some(&false));
    }

    #[test]
    fn cdcl_without_conversion_is_an_error() {
        let options = SolveOptions {
            cnf_conversion: false,
            ..SolveOptions::default()
        };
        assert!(solve_expr(&Expr::var("x"), &options).is_err());
    }
}
