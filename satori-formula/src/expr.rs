//! Free-form boolean formulas.
use std::fmt;

use rustc_hash::FxHashMap;

use crate::stats::FormulaStats;

/// A boolean formula over named variables.
///
/// This is the shape produced by the prefix parser. It allows every
/// connective; the negation-normal tree and the CNF conversion consume it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Var(String),
    Const(bool),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Iff(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn not(arg: Expr) -> Expr {
        Expr::Not(Box::new(arg))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn implies(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn iff(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Iff(Box::new(lhs), Box::new(rhs))
    }

    /// Evaluate under a name → value assignment.
    ///
    /// Unassigned variables evaluate to false.
    pub fn evaluate(&self, assignment: &FxHashMap<String, bool>) -> bool {
        match self {
            Expr::Var(name) => assignment.get(name).copied().unwrap_or(false),
            Expr::Const(value) => *value,
            Expr::Not(arg) => !arg.evaluate(assignment),
            Expr::And(lhs, rhs) => lhs.evaluate(assignment) && rhs.evaluate(assignment),
            Expr::Or(lhs, rhs) => lhs.evaluate(assignment) || rhs.evaluate(assignment),
            Expr::Implies(lhs, rhs) => !lhs.evaluate(assignment) || rhs.evaluate(assignment),
            Expr::Iff(lhs, rhs) => lhs.evaluate(assignment) == rhs.evaluate(assignment),
        }
    }

    fn metrics(&self) -> (usize, usize) {
        match self {
            Expr::Var(_) | Expr::Const(_) => (1, 1),
            Expr::Not(arg) => {
                let (depth, complexity) = arg.metrics();
                (depth + 1, complexity + 1)
            }
            Expr::And(lhs, rhs)
            | Expr::Or(lhs, rhs)
            | Expr::Implies(lhs, rhs)
            | Expr::Iff(lhs, rhs) => {
                let (depth_l, complexity_l) = lhs.metrics();
                let (depth_r, complexity_r) = rhs.metrics();
                (depth_l.max(depth_r) + 1, complexity_l + complexity_r + 1)
            }
        }
    }

    /// Measure the formula for stage banners.
    pub fn measure(&self) -> FormulaStats {
        let (depth, complexity) = self.metrics();
        FormulaStats {
            depth,
            complexity,
            ..FormulaStats::default()
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(true) => write!(f, "T"),
            Expr::Const(false) => write!(f, "F"),
            Expr::Not(arg) => write!(f, "-{}", arg),
            Expr::And(lhs, rhs) => write!(f, "({} ^ {})", lhs, rhs),
            Expr::Or(lhs, rhs) => write!(f, "({} v {})", lhs, rhs),
            Expr::Implies(lhs, rhs) => write!(f, "({} -> {})", lhs, rhs),
            Expr::Iff(lhs, rhs) => write!(f, "({} <-> {})", lhs, rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(pairs: &[(&str, bool)]) -> FxHashMap<String, bool> {
        pairs
            .iter()
            .map(|&(name, value)| (name.to_owned(), value))
            .collect()
    }

    #[test]
    fn evaluate_connectives() {
        let formula = Expr::iff(
            Expr::implies(Expr::var("a"), Expr::var("b")),
            Expr::or(Expr::not(Expr::var("a")), Expr::var("b")),
        );
        for &a in &[false, true] {
            for &b in &[false, true] {
                assert!(formula.evaluate(&assignment(&[("a", a), ("b", b)])));
            }
        }
    }

    #[test]
    fn metrics_grow_with_nesting() {
        let flat = Expr::var("x");
        let nested = Expr::and(Expr::var("x"), Expr::not(Expr::var("y")));
        assert!(nested.measure().depth > flat.measure().depth);
        assert!(nested.measure().complexity > flat.measure().complexity);
    }
}
