//! Tseitin transformation of free-form formulas into CNF.
//!
//! Every compound subformula gets a fresh auxiliary variable together with a
//! small gadget of clauses making the auxiliary equivalent to the
//! connective applied to its children. The result is equisatisfiable with
//! the input: any model of the input extends to the auxiliaries and any
//! model of the CNF restricts to a model of the input.
use log::debug;

use satori_formula::{CnfFormula, Expr, FormulaRepr, Lit, SatFormula, UnsatReason, VarMap};

/// A literal that may also be one of the boolean constants.
///
/// Constants exist only at this conversion boundary; the elimination pass
/// folds them away before any later stage runs.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum CLit {
    True,
    False,
    Lit(Lit),
}

impl CLit {
    fn negate(self) -> CLit {
        match self {
            CLit::True => CLit::False,
            CLit::False => CLit::True,
            CLit::Lit(lit) => CLit::Lit(!lit),
        }
    }
}

/// Convert a formula to an equisatisfiable CNF.
///
/// Interns the formula's variable names into a fresh mapping; the
/// auxiliaries allocated for subformulas are flagged as non-founders. After
/// conversion a unit clause asserts the root and constants are eliminated,
/// which can already decide the formula UNSAT.
pub fn to_cnf(expr: &Expr) -> SatFormula {
    let mut vars = VarMap::new();
    let mut clauses: Vec<Vec<CLit>> = vec![];

    let root = convert(expr, &mut vars, &mut clauses);

    // Assert the root literal (or constant, for a degenerate formula).
    clauses.push(vec![root]);

    debug!(
        "tseitin conversion produced {} clauses over {} variables",
        clauses.len(),
        vars.len()
    );

    eliminate_constants(clauses, vars)
}

/// Emit the gadget clauses for a subformula and return its literal.
fn convert(expr: &Expr, vars: &mut VarMap, clauses: &mut Vec<Vec<CLit>>) -> CLit {
    match expr {
        Expr::Var(name) => CLit::Lit(vars.intern(name).positive()),
        Expr::Const(true) => CLit::True,
        Expr::Const(false) => CLit::False,
        Expr::Not(arg) => {
            // A negated variable needs no gadget at all.
            if let Expr::Var(name) = &**arg {
                return CLit::Lit(vars.intern(name).negative());
            }
            let b = convert(arg, vars, clauses);
            let a = fresh_lit(vars);
            // a <-> -b
            clauses.push(vec![a.negate(), b.negate()]);
            clauses.push(vec![b, a]);
            a
        }
        Expr::And(lhs, rhs) => {
            let b = convert(lhs, vars, clauses);
            let c = convert(rhs, vars, clauses);
            let a = fresh_lit(vars);
            // a <-> (b ^ c)
            clauses.push(vec![a.negate(), b]);
            clauses.push(vec![a.negate(), c]);
            clauses.push(vec![a, b.negate(), c.negate()]);
            a
        }
        Expr::Or(lhs, rhs) => {
            let b = convert(lhs, vars, clauses);
            let c = convert(rhs, vars, clauses);
            let a = fresh_lit(vars);
            // a <-> (b v c)
            clauses.push(vec![a.negate(), b, c]);
            clauses.push(vec![b.negate(), a]);
            clauses.push(vec![c.negate(), a]);
            a
        }
        Expr::Implies(lhs, rhs) => {
            let b = convert(lhs, vars, clauses);
            let c = convert(rhs, vars, clauses);
            let a = fresh_lit(vars);
            // a <-> (b -> c)
            clauses.push(vec![a.negate(), b.negate(), c]);
            clauses.push(vec![b, a]);
            clauses.push(vec![c.negate(), a]);
            a
        }
        Expr::Iff(lhs, rhs) => {
            let b = convert(lhs, vars, clauses);
            let c = convert(rhs, vars, clauses);
            let a = fresh_lit(vars);
            // a <-> (b <-> c)
            clauses.push(vec![a, b, c]);
            clauses.push(vec![b.negate(), a.negate(), c]);
            clauses.push(vec![c.negate(), a.negate(), b]);
            clauses.push(vec![c.negate(), b.negate(), a]);
            a
        }
    }
}

fn fresh_lit(vars: &mut VarMap) -> CLit {
    let (_, var) = vars.fresh();
    CLit::Lit(var.positive())
}

/// Strip boolean constants from the converted clauses.
///
/// A true literal satisfies and removes its clause, a false literal is
/// dropped from it. A clause reduced to nothing makes the formula UNSAT.
fn eliminate_constants(clauses: Vec<Vec<CLit>>, vars: VarMap) -> SatFormula {
    let mut formula = CnfFormula::new();
    formula.set_var_count(vars.len());

    for clause in &clauses {
        if clause.contains(&CLit::True) {
            continue;
        }
        let lits: Vec<Lit> = clause
            .iter()
            .filter_map(|&clit| match clit {
                CLit::Lit(lit) => Some(lit),
                _ => None,
            })
            .collect();
        if lits.is_empty() {
            return SatFormula::shortcut(
                FormulaRepr::Cnf(formula),
                vars,
                UnsatReason::CnfNormalization,
            );
        }
        formula.add_clause(lits);
    }

    SatFormula::new(FormulaRepr::Cnf(formula), vars)
}

/// Wrap a ready-made CNF, checking for empty clauses.
///
/// This is the entry point for CNF-level input, which bypasses the
/// conversion but still needs the empty clause check the conversion performs
/// on its own output.
pub fn normalize_cnf(cnf: CnfFormula, vars: VarMap) -> SatFormula {
    for clause in cnf.iter() {
        if clause.is_empty() {
            return SatFormula::shortcut(
                FormulaRepr::Cnf(cnf.clone()),
                vars,
                UnsatReason::CnfNormalization,
            );
        }
    }
    SatFormula::new(FormulaRepr::Cnf(cnf), vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rustc_hash::FxHashMap;

    use crate::checker;

    fn cnf_of(formula: &SatFormula) -> &CnfFormula {
        match formula.repr() {
            FormulaRepr::Cnf(cnf) => cnf,
            other => panic!("expected CNF, got {:?}", other),
        }
    }

    /// The conversion is equisatisfiable: check both directions by
    /// enumeration over the founder variables.
    fn assert_equisatisfiable(expr: &Expr) {
        let converted = to_cnf(expr);
        let vars = converted.vars();

        let founders: Vec<_> = vars.founders().map(|(var, name)| (var, name.to_owned())).collect();

        let cnf_sat = match converted.unsat_reason() {
            Some(_) => false,
            None => checker::solve_cnf(cnf_of(&converted)).unwrap().is_some(),
        };

        let mut expr_sat = false;
        for values in 0u32..(1u32 << founders.len()) {
            let mut assignment = FxHashMap::default();
            for (index, (_, name)) in founders.iter().enumerate() {
                assignment.insert(name.clone(), (values >> index) & 1 != 0);
            }
            if expr.evaluate(&assignment) {
                expr_sat = true;
                break;
            }
        }

        assert_eq!(expr_sat, cnf_sat, "conversion changed satisfiability");
    }

    #[test]
    fn variable_converts_to_unit() {
        let converted = to_cnf(&Expr::var("x"));
        let cnf = cnf_of(&converted);
        assert_eq!(cnf.len(), 1);
        assert_eq!(cnf.iter().next().unwrap().len(), 1);
        assert!(converted.unsat_reason().is_none());
    }

    #[test]
    fn and_gadget_shape() {
        let converted = to_cnf(&Expr::and(Expr::var("a"), Expr::var("b")));
        let cnf = cnf_of(&converted);
        // Three gadget clauses plus the root unit.
        assert_eq!(cnf.len(), 4);
        assert_eq!(converted.vars().len(), 3);
    }

    #[test]
    fn true_constant_is_sat() {
        let converted = to_cnf(&Expr::Const(true));
        assert!(converted.unsat_reason().is_none());
        assert_eq!(cnf_of(&converted).len(), 0);
    }

    #[test]
    fn false_constant_is_unsat() {
        let converted = to_cnf(&Expr::Const(false));
        assert_eq!(
            converted.unsat_reason(),
            Some(&UnsatReason::CnfNormalization)
        );
    }

    #[test]
    fn conversions_preserve_satisfiability() {
        let x = Expr::var("x");
        let y = Expr::var("y");

        assert_equisatisfiable(&Expr::and(x.clone(), Expr::not(x.clone())));
        assert_equisatisfiable(&Expr::or(x.clone(), Expr::not(x.clone())));
        assert_equisatisfiable(&Expr::iff(x.clone(), Expr::not(x.clone())));
        assert_equisatisfiable(&Expr::implies(
            Expr::and(x.clone(), y.clone()),
            Expr::or(x.clone(), y.clone()),
        ));
        assert_equisatisfiable(&Expr::and(
            Expr::iff(x.clone(), y.clone()),
            Expr::not(Expr::implies(x.clone(), y.clone())),
        ));
        assert_equisatisfiable(&Expr::and(x.clone(), Expr::Const(false)));
        assert_equisatisfiable(&Expr::or(Expr::not(x), Expr::Const(true)));
    }

    #[test]
    fn normalize_cnf_detects_empty_clause() {
        let mut cnf = CnfFormula::new();
        cnf.add_clause(Vec::<Lit>::new());
        let wrapped = normalize_cnf(cnf, VarMap::new());
        assert_eq!(
            wrapped.unsat_reason(),
            Some(&UnsatReason::CnfNormalization)
        );
    }
}
