//! Partial assignment and backtracking.
use partial_ref::{partial, PartialRef};

use satori_formula::{lit::LitIdx, Lit, Var};

use crate::context::{AssignmentP, Context, ImplGraphP, TrailP, VsidsP};
use crate::decision::make_available;

use super::Reason;

/// Current partial assignment.
#[derive(Default)]
pub struct Assignment {
    assignment: Vec<Option<bool>>,
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.assignment.resize(count, None);
    }

    /// Current partial assignment as slice.
    pub fn assignment(&self) -> &[Option<bool>] {
        &self.assignment
    }

    /// Value assigned to a variable.
    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.assignment[var.index()]
    }

    /// Value assigned to a literal.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.index()].map(|value| value ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_positive())
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_negative())
    }

    pub fn lit_is_unk(&self, lit: Lit) -> bool {
        self.assignment[lit.index()].is_none()
    }

    pub fn assign_lit(&mut self, lit: Lit) {
        self.assignment[lit.index()] = Some(lit.is_positive())
    }

    pub fn unassign_var(&mut self, var: Var) {
        self.assignment[var.index()] = None
    }
}

/// Decision and propagation history.
#[derive(Default)]
pub struct Trail {
    /// Stack of all propagated and enqueued assignments.
    trail: Vec<Lit>,
    /// Index of the next assignment to propagate.
    queue_head_pos: usize,
    /// Trail index where each decision level begins.
    decisions: Vec<LitIdx>,
}

impl Trail {
    /// Return the next assigned literal to propagate and advance the queue.
    pub fn pop_queue(&mut self) -> Option<Lit> {
        let head = self.trail.get(self.queue_head_pos).cloned();
        if head.is_some() {
            self.queue_head_pos += 1;
        }
        head
    }

    /// Assigned literals in assignment order.
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    /// Start a new decision level.
    ///
    /// Does not enqueue the decision itself.
    pub fn new_decision_level(&mut self) {
        self.decisions.push(self.trail.len() as LitIdx)
    }

    /// Current decision level, 0 being the root level of forced facts.
    pub fn current_level(&self) -> usize {
        self.decisions.len()
    }

    /// Trail index where the given decision level starts.
    pub fn level_start(&self, level: usize) -> usize {
        if level == 0 {
            0
        } else {
            self.decisions[level - 1] as usize
        }
    }

    /// Whether all assignments are processed.
    pub fn fully_propagated(&self) -> bool {
        self.queue_head_pos == self.trail.len()
    }
}

/// Enqueue the assignment of true to a literal.
///
/// Updates the assignment and trail without propagating anything. The
/// literal has to be unassigned when calling this.
pub fn enqueue_assignment(
    mut ctx: partial!(Context, mut AssignmentP, mut ImplGraphP, mut TrailP),
    lit: Lit,
    reason: Reason,
) {
    let assignment = ctx.part_mut(AssignmentP);
    debug_assert!(assignment.lit_value(lit) == None);

    assignment.assign_lit(lit);

    let (trail, mut ctx) = ctx.split_part_mut(TrailP);

    trail.trail.push(lit);

    let node = &mut ctx.part_mut(ImplGraphP).nodes[lit.index()];
    node.reason = reason;
    node.level = trail.decisions.len() as LitIdx;
}

/// Undo all assignments in decision levels deeper than the given level.
///
/// The implication graph entries of unassigned variables are left in place,
/// they are overwritten on reassignment.
pub fn backtrack(
    mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP),
    level: usize,
) {
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (trail, mut ctx) = ctx.split_part_mut(TrailP);

    if level >= trail.decisions.len() {
        return;
    }

    let new_trail_len = trail.decisions[level] as usize;

    trail.queue_head_pos = new_trail_len;
    trail.decisions.truncate(level);

    for &lit in &trail.trail[new_trail_len..] {
        make_available(ctx.borrow(), lit.var());
        assignment.unassign_var(lit.var());
    }
    trail.trail.truncate(new_trail_len);
}
