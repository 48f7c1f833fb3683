//! Boolean satisfiability solver.
use std::io;

use anyhow::Error;
use log::info;
use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};

use satori_dimacs::DimacsParser;
use satori_formula::{CnfFormula, Lit, Var};

use crate::cdcl::conflict_step;
use crate::config::SolverConfigUpdate;
use crate::context::{ensure_var_count, AssignmentP, Context, SolverConfigP, SolverStateP};
use crate::load::load_clause;
use crate::state::SatState;

/// A boolean satisfiability solver.
///
/// Works directly on CNF; use [`pipeline`](crate::pipeline) to solve
/// free-form formulas.
#[derive(Default)]
pub struct Solver {
    ctx: Box<Context>,
}

impl Solver {
    /// Create a new solver.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// Change the solver configuration.
    pub fn config(&mut self, update: &SolverConfigUpdate) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(SolverConfigP).apply(update);
    }

    /// Add a formula to the solver.
    pub fn add_formula(&mut self, formula: &CnfFormula) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ensure_var_count(ctx.borrow(), formula.var_count());
        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }
    }

    /// Read and add a formula in DIMACS CNF format.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), Error> {
        let formula = DimacsParser::parse(input)?;

        info!(
            "parsed formula with {} variables and {} clauses",
            formula.var_count(),
            formula.len()
        );

        self.add_formula(&formula);

        Ok(())
    }

    /// Check the satisfiability of the current formula.
    pub fn solve(&mut self) -> bool {
        let mut ctx = self.ctx.into_partial_ref_mut();
        while ctx.part(SolverStateP).sat_state == SatState::Unknown {
            conflict_step(ctx.borrow());
        }
        ctx.part(SolverStateP).sat_state == SatState::Sat
    }

    /// Set of literals that satisfy the formula.
    ///
    /// Only available after [`solve`](Solver::solve) returned true.
    pub fn model(&self) -> Option<Vec<Lit>> {
        let ctx = self.ctx.into_partial_ref();
        if ctx.part(SolverStateP).sat_state == SatState::Sat {
            Some(
                ctx.part(AssignmentP)
                    .assignment()
                    .iter()
                    .enumerate()
                    .flat_map(|(index, assignment)| {
                        assignment.map(|value| Lit::from_var(Var::from_index(index), value))
                    })
                    .collect(),
            )
        } else {
            None
        }
    }
}
