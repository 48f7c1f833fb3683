//! Decision heuristics.
pub mod vsids;

use partial_ref::{partial, PartialRef};

use satori_formula::Var;

use crate::context::{AssignmentP, Context, ImplGraphP, TrailP, VsidsP};
use crate::prop::{enqueue_assignment, Reason};

/// Make a decision and enqueue it.
///
/// Pops variables off the activity heap until an unassigned one is found and
/// branches on it with positive polarity. When the heap runs dry the
/// remaining variables are scanned linearly.
///
/// Returns `false` if no decision was made because all variables are
/// assigned.
pub fn make_decision(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ImplGraphP,
        mut TrailP,
        mut VsidsP,
    ),
) -> bool {
    let decision_var = loop {
        match ctx.part_mut(VsidsP).pop() {
            Some(var) => {
                if ctx.part(AssignmentP).var_value(var).is_none() {
                    break Some(var);
                }
            }
            None => {
                // Fallback: any unassigned variable will do.
                break ctx
                    .part(AssignmentP)
                    .assignment()
                    .iter()
                    .position(|value| value.is_none())
                    .map(Var::from_index);
            }
        }
    };

    let decision_var = match decision_var {
        Some(var) => var,
        None => return false,
    };

    ctx.part_mut(TrailP).new_decision_level();
    enqueue_assignment(ctx.borrow(), decision_var.positive(), Reason::Decision);

    true
}

/// Return a variable to the activity heap after it was unassigned.
pub fn make_available(mut ctx: partial!(Context, mut VsidsP), var: Var) {
    ctx.part_mut(VsidsP).make_available(var);
}
