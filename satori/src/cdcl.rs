//! Conflict driven clause learning.
use partial_ref::{partial, PartialRef};

use crate::analyze_conflict::analyze_conflict;
use crate::clause::{bump_clause_activity, decay_clause_activities};
use crate::context::{
    AnalyzeConflictP, AssignmentP, ClauseActivityP, ClauseAllocP, Context, ImplGraphP,
    SolverConfigP, SolverStateP, TmpDataP, TrailP, VsidsP, WatchlistsP,
};
use crate::decision::make_decision;
use crate::glue::compute_lbd;
use crate::prop::{backtrack, enqueue_assignment, propagate, Conflict, Reason};
use crate::state::SatState;

/// Find a conflict, learn a clause and backtrack.
///
/// When no conflict is left the assignment is total and the solver state
/// becomes SAT; a conflict at level 0 makes it UNSAT.
pub fn conflict_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ClauseActivityP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        SolverConfigP,
    ),
) {
    let conflict = match find_conflict(ctx.borrow()) {
        Ok(()) => {
            ctx.part_mut(SolverStateP).sat_state = SatState::Sat;
            return;
        }
        Err(conflict) => conflict,
    };

    let backtrack_to = analyze_conflict(ctx.borrow(), conflict);

    let (analyze, mut ctx) = ctx.split_part(AnalyzeConflictP);

    for &cref in analyze.involved() {
        bump_clause_activity(ctx.borrow(), cref);
    }
    decay_clause_activities(ctx.borrow());

    let clause = analyze.clause();

    if clause.is_empty() {
        ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
        return;
    }

    // The decay rate adapts to the learned clause's LBD, computed while the
    // clause's literals are still assigned.
    let lbd = compute_lbd(ctx.borrow(), clause);
    let (config, mut ctx) = ctx.split_part(SolverConfigP);
    ctx.part_mut(VsidsP).note_learned_clause(lbd as f64, config);

    backtrack(ctx.borrow(), backtrack_to);

    let reason = if clause.len() == 1 {
        // A unit learned clause becomes a root level fact.
        Reason::Decision
    } else {
        let cref = ctx.part_mut(ClauseAllocP).add_clause(clause);
        ctx.part_mut(WatchlistsP)
            .watch_clause(cref, [clause[0], clause[1]]);
        Reason::Clause(cref)
    };

    enqueue_assignment(ctx.borrow(), clause[0], reason);
}

/// Propagate and make decisions until a conflict is found.
///
/// Returns `Ok` if a satisfying assignment was found instead.
fn find_conflict(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
    ),
) -> Result<(), Conflict> {
    loop {
        propagate(ctx.borrow())?;

        if !make_decision(ctx.borrow()) {
            return Ok(());
        }
    }
}
