//! Learns a new clause by analyzing a conflict.
use std::mem::swap;

use partial_ref::{partial, split_borrow, PartialRef};

use satori_formula::{Lit, Var};

use crate::clause::ClauseRef;
use crate::context::{AnalyzeConflictP, ClauseAllocP, Context, ImplGraphP, TrailP, VsidsP};
use crate::prop::{Conflict, Reason};

/// Temporaries for conflict analysis.
#[derive(Default)]
pub struct AnalyzeConflict {
    /// This is the learned clause after analysis finishes.
    clause: Vec<Lit>,
    /// Number of literals of the current decision level still to resolve.
    current_level_count: usize,
    /// Variables present in the current clause.
    var_flags: Vec<bool>,
    /// Entries to clean in `var_flags`.
    to_clean: Vec<Var>,
    /// Clauses involved in the conflict, for activity bumping.
    involved: Vec<ClauseRef>,
}

impl AnalyzeConflict {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_flags.resize(count, false);
    }

    /// The learned clause.
    ///
    /// The asserting literal is in slot 0 and the literal of the highest
    /// remaining decision level in slot 1.
    pub fn clause(&self) -> &[Lit] {
        &self.clause
    }

    /// Clauses involved in the conflict.
    pub fn involved(&self) -> &[ClauseRef] {
        &self.involved
    }
}

/// Learns a new clause by analyzing a conflict.
///
/// Performs first-UIP learning: the conflicting clause is resolved with the
/// antecedents of its current-level literals in reverse trail order until a
/// single literal of the current level remains. Every variable seen on the
/// way gets its activity bumped.
///
/// Returns the lowest decision level that makes the learned clause
/// asserting. A conflict at level 0 yields the empty clause.
pub fn analyze_conflict(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut VsidsP,
        ClauseAllocP,
        ImplGraphP,
        TrailP,
    ),
    conflict: Conflict,
) -> usize {
    split_borrow!(alloc_ctx = &(ClauseAllocP) ctx);

    {
        let analyze = ctx.part_mut(AnalyzeConflictP);

        analyze.clause.clear();
        analyze.involved.clear();
        analyze.current_level_count = 0;
    }

    if ctx.part(TrailP).current_level() == 0 {
        // Conflict with no decisions, the empty clause is learned.
        return 0;
    }

    // We start with all literals of the conflicting clause.
    for &lit in conflict.lits(alloc_ctx.part(ClauseAllocP)) {
        add_literal(ctx.borrow(), lit);
    }
    ctx.part_mut(AnalyzeConflictP).involved.push(conflict.cref);

    // To get rid of all but one literal of the current level, the clause is
    // resolved with the antecedents of those literals in reverse
    // chronological order.
    split_borrow!(trail_ctx = &(TrailP) ctx);

    for &lit in trail_ctx.part(TrailP).trail().iter().rev() {
        let analyze = ctx.part_mut(AnalyzeConflictP);
        let lit_present = &mut analyze.var_flags[lit.index()];
        if *lit_present {
            *lit_present = false;
            analyze.current_level_count -= 1;
            if analyze.current_level_count == 0 {
                // lit is the last current-level literal in the clause: the
                // unique implication point. The clause asserts !lit, which
                // goes into slot 0.
                analyze.clause.push(!lit);
                let end = analyze.clause.len() - 1;
                analyze.clause.swap(0, end);
                break;
            } else {
                // Remove the literal and resolve with its antecedent.
                let (graph, mut ctx) = ctx.split_part(ImplGraphP);
                let reason = graph.reason(lit.var());

                for &reason_lit in reason.lits(alloc_ctx.part(ClauseAllocP)) {
                    add_literal(ctx.borrow(), reason_lit);
                }

                if let &Reason::Clause(cref) = reason {
                    ctx.part_mut(AnalyzeConflictP).involved.push(cref);
                }
            }
        }
    }

    let (analyze, ctx) = ctx.split_part_mut(AnalyzeConflictP);

    for var in analyze.to_clean.drain(..) {
        analyze.var_flags[var.index()] = false;
    }

    // Move the highest-level literal besides the asserting one into slot 1.
    // Its level is the backjump target and the ordering keeps the watchlist
    // invariant intact after backtracking.
    let mut backtrack_to = 0;

    if analyze.clause.len() > 1 {
        let (prefix, rest) = analyze.clause.split_at_mut(2);
        let lit_1 = &mut prefix[1];
        backtrack_to = ctx.part(ImplGraphP).level(lit_1.var());
        for lit in rest.iter_mut() {
            let lit_level = ctx.part(ImplGraphP).level(lit.var());
            if lit_level > backtrack_to {
                backtrack_to = lit_level;
                swap(lit_1, lit);
            }
        }
    }

    backtrack_to
}

/// Add a literal to the current clause.
///
/// Literals forced at level 0 are always false here and can be dropped.
/// Current-level literals are counted instead of added, they are resolved
/// away by the trail walk.
fn add_literal(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut VsidsP,
        ImplGraphP,
        TrailP
    ),
    lit: Lit,
) {
    let (analyze, mut ctx) = ctx.split_part_mut(AnalyzeConflictP);
    let lit_level = ctx.part(ImplGraphP).level(lit.var());
    if lit_level > 0 && !analyze.var_flags[lit.index()] {
        ctx.part_mut(VsidsP).bump(lit.var());

        analyze.var_flags[lit.index()] = true;
        if lit_level == ctx.part(TrailP).current_level() {
            analyze.current_level_count += 1;
        } else {
            analyze.clause.push(lit);
            analyze.to_clean.push(lit.var());
        }
    }
}
