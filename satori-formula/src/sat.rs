//! Shared formula wrapper passed between pipeline stages.
use std::fmt;

use thiserror::Error;

use crate::cnf::CnfFormula;
use crate::expr::Expr;
use crate::nwf::Nwf;
use crate::stats::FormulaStats;
use crate::vars::VarMap;

/// Why a stage concluded the formula is unsatisfiable.
///
/// Unsatisfiability is a result, not an error: whichever stage detects it
/// wraps its current formula into a short-circuit [`SatFormula`] carrying one
/// of these reasons, and downstream stages pass that wrapper through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsatReason {
    #[error("empty clause detected when normalizing the CNF formula")]
    CnfNormalization,
    #[error("unit propagation derived a literal together with its negation")]
    UnitPropagation,
    #[error("strengthening clause {clause} by variable {var} produced an empty clause")]
    Strengthening { clause: String, var: String },
    #[error("conflict at decision level 0")]
    CdclConflict,
    #[error("exhaustive search found no satisfying assignment")]
    Exhausted,
    #[error("{message}: {reason}")]
    Trace {
        message: String,
        reason: Box<UnsatReason>,
    },
}

impl UnsatReason {
    /// Wrap the reason with a contextual trace message.
    pub fn trace(self, message: impl Into<String>) -> UnsatReason {
        UnsatReason::Trace {
            message: message.into(),
            reason: Box::new(self),
        }
    }

    /// The innermost reason, unwrapping trace layers.
    pub fn root(&self) -> &UnsatReason {
        match self {
            UnsatReason::Trace { reason, .. } => reason.root(),
            other => other,
        }
    }
}

/// The concrete representation held by a [`SatFormula`].
#[derive(Clone, Debug)]
pub enum FormulaRepr {
    Expr(Expr),
    Nwf(Nwf),
    Cnf(CnfFormula),
}

impl FormulaRepr {
    /// Measure the representation for stage banners.
    pub fn measure(&self) -> FormulaStats {
        match self {
            FormulaRepr::Expr(expr) => expr.measure(),
            FormulaRepr::Nwf(nwf) => nwf.measure(),
            FormulaRepr::Cnf(cnf) => cnf.measure(),
        }
    }
}

/// A formula representation bundled with its variable mapping.
///
/// Thin holder handed from stage to stage. When `unsat` is set the formula is
/// a short-circuit marker and its representation is whatever the detecting
/// stage last held.
#[derive(Clone, Debug)]
pub struct SatFormula {
    repr: FormulaRepr,
    vars: VarMap,
    unsat: Option<UnsatReason>,
    stats: Option<FormulaStats>,
}

impl SatFormula {
    /// Wrap a representation with its variable mapping.
    pub fn new(repr: FormulaRepr, vars: VarMap) -> SatFormula {
        SatFormula {
            repr,
            vars,
            unsat: None,
            stats: None,
        }
    }

    /// Wrap a representation as an UNSAT short-circuit.
    pub fn shortcut(repr: FormulaRepr, vars: VarMap, reason: UnsatReason) -> SatFormula {
        SatFormula {
            repr,
            vars,
            unsat: Some(reason),
            stats: None,
        }
    }

    pub fn repr(&self) -> &FormulaRepr {
        &self.repr
    }

    pub fn vars(&self) -> &VarMap {
        &self.vars
    }

    pub fn into_parts(self) -> (FormulaRepr, VarMap, Option<UnsatReason>) {
        (self.repr, self.vars, self.unsat)
    }

    /// The attached UNSAT reason, if this is a short-circuit formula.
    pub fn unsat_reason(&self) -> Option<&UnsatReason> {
        self.unsat.as_ref()
    }

    /// Whether a previous stage already decided UNSAT.
    pub fn is_shortcut(&self) -> bool {
        self.unsat.is_some()
    }

    /// Size measurements, computed once and cached.
    pub fn stats(&mut self) -> FormulaStats {
        if self.stats.is_none() {
            self.stats = Some(self.repr.measure());
        }
        self.stats.unwrap()
    }

    /// One-line summary for stage banners.
    pub fn brief(&mut self) -> String {
        match &self.unsat {
            Some(reason) => format!("UNSAT formula: {}", reason),
            None => self.stats().to_string(),
        }
    }
}

impl fmt::Display for SatFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(reason) = &self.unsat {
            writeln!(f, "UNSAT formula: {}", reason)?;
        }
        match &self.repr {
            FormulaRepr::Expr(expr) => write!(f, "{}", expr),
            FormulaRepr::Nwf(nwf) => write!(f, "{}", nwf.to_expr(&self.vars)),
            FormulaRepr::Cnf(cnf) => {
                let clauses: Vec<String> = cnf
                    .iter()
                    .map(|clause| {
                        let lits: Vec<String> =
                            clause.iter().map(|&lit| self.vars.display(lit)).collect();
                        format!("({})", lits.join(" v "))
                    })
                    .collect();
                write!(f, "{}", clauses.join("^"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_wraps_and_unwraps() {
        let reason = UnsatReason::UnitPropagation.trace("while simplifying");
        assert_eq!(reason.root(), &UnsatReason::UnitPropagation);
        let rendered = reason.to_string();
        assert!(rendered.starts_with("while simplifying: "));
    }

    #[test]
    fn shortcut_formula_reports_reason() {
        let vars = VarMap::new();
        let formula = SatFormula::shortcut(
            FormulaRepr::Cnf(CnfFormula::new()),
            vars,
            UnsatReason::CnfNormalization,
        );
        assert!(formula.is_shortcut());
        assert_eq!(
            formula.unsat_reason(),
            Some(&UnsatReason::CnfNormalization)
        );
    }
}
