//! Brute force baseline solver.
//!
//! Enumerates all assignments of the variables occurring in a formula. Used
//! as an independent cross-check for the CDCL solver and as the `brute`
//! solver selectable from the command line. Exponential, so it refuses
//! formulas with more than a handful of variables.
use thiserror::Error;

use satori_formula::{CnfFormula, Nwf, Var, VarMap};

/// Largest number of distinct variables the enumerator accepts.
///
/// Assignments are enumerated as the bits of a `u64` counter.
const MAX_VARS: usize = 63;

/// Internal faults of the baseline checker.
///
/// These are programmer or usage errors, distinct from an UNSAT result.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("too many variables for the brute force solver ({count})")]
    TooManyVariables { count: usize },
}

/// Exhaustively solve a CNF formula.
///
/// Returns a satisfying assignment over the formula's occurring variables,
/// or `None` if no assignment satisfies it. A formula containing the empty
/// clause is unsatisfiable without enumeration.
pub fn solve_cnf(formula: &CnfFormula) -> Result<Option<Vec<(Var, bool)>>, CheckerError> {
    let (normalized, back) = match formula.normalize_vars() {
        Some(result) => result,
        None => return Ok(None),
    };

    let var_count = back.len();
    if var_count > MAX_VARS {
        return Err(CheckerError::TooManyVariables { count: var_count });
    }

    let mut assignment = vec![false; var_count];
    for values in 0u64..(1u64 << var_count) {
        for (index, value) in assignment.iter_mut().enumerate() {
            *value = (values >> index) & 1 != 0;
        }
        if normalized.evaluate(&assignment) {
            let model = assignment
                .iter()
                .enumerate()
                .map(|(index, &value)| (back[index], value))
                .collect();
            return Ok(Some(model));
        }
    }

    Ok(None)
}

/// Exhaustively solve a negation-normal formula.
///
/// Enumerates over all variables of the mapping, as the tree holds no dense
/// variable set of its own.
pub fn solve_nwf(formula: &Nwf, vars: &VarMap) -> Result<Option<Vec<(Var, bool)>>, CheckerError> {
    let var_count = vars.len();
    if var_count > MAX_VARS {
        return Err(CheckerError::TooManyVariables { count: var_count });
    }

    let mut assignment = vec![false; var_count];
    for values in 0u64..(1u64 << var_count) {
        for (index, value) in assignment.iter_mut().enumerate() {
            *value = (values >> index) & 1 != 0;
        }
        if formula.evaluate(&assignment) {
            let model = assignment
                .iter()
                .enumerate()
                .map(|(index, &value)| (Var::from_index(index), value))
                .collect();
            return Ok(Some(model));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    use satori_formula::cnf_formula;

    #[test]
    fn finds_forced_assignment() {
        let formula = cnf_formula![
            1, 2;
            -1, 2;
            1, -2;
        ];
        let model = solve_cnf(&formula).unwrap().unwrap();
        assert!(model.contains(&(Var::from_index(0), true)));
        assert!(model.contains(&(Var::from_index(1), true)));
    }

    #[test]
    fn detects_unsat() {
        let formula = cnf_formula![
            1;
            -1;
        ];
        assert!(solve_cnf(&formula).unwrap().is_none());
    }

    #[test]
    fn empty_clause_is_unsat() {
        let formula = cnf_formula![
            1, 2;
            ;
        ];
        assert!(solve_cnf(&formula).unwrap().is_none());
    }

    #[test]
    fn empty_formula_is_sat() {
        let formula = CnfFormula::new();
        assert_eq!(solve_cnf(&formula).unwrap(), Some(vec![]));
    }

    #[test]
    fn rejects_large_formulas() {
        let mut formula = CnfFormula::new();
        let clause: Vec<_> = (0..70).map(|i| Var::from_index(i).positive()).collect();
        formula.add_clause(clause);
        assert!(solve_cnf(&formula).is_err());
    }
}
