//! Clause activity.
//!
//! Clauses involved in conflicts get their activity bumped and all clause
//! activities decay after each learned clause. Nothing consumes these values
//! yet: learned clauses are never freed in the current design, but the
//! bookkeeping is the hook a reduction policy would build on.
use partial_ref::{partial, PartialRef};

use crate::config::SolverConfig;
use crate::context::{ClauseActivityP, ClauseAllocP, Context};

use super::ClauseRef;

/// Global state for bumping and decaying clause activities.
///
/// The per-clause values live in the clause arena.
pub struct ClauseActivity {
    /// The value to add on bumping.
    bump: f32,
    /// The inverse of the decay factor.
    inv_decay: f32,
}

impl Default for ClauseActivity {
    fn default() -> ClauseActivity {
        ClauseActivity {
            bump: 1.0,
            inv_decay: 1.0 / SolverConfig::default().clause_activity_decay,
        }
    }
}

impl ClauseActivity {
    /// Change the decay factor.
    pub fn set_decay(&mut self, decay: f32) {
        assert!(decay < 1.0);
        assert!(decay > 1.0 / 16.0);
        self.inv_decay = 1.0 / decay;
    }
}

/// Rescale activities if any value exceeds this value.
fn rescale_limit() -> f32 {
    std::f32::MAX / 16.0
}

/// Increase a clause's activity.
pub fn bump_clause_activity(
    mut ctx: partial!(Context, mut ClauseActivityP, mut ClauseAllocP),
    cref: ClauseRef,
) {
    let bump = ctx.part(ClauseActivityP).bump;
    let alloc = ctx.part_mut(ClauseAllocP);

    let activity = alloc.activity(cref) + bump;
    alloc.set_activity(cref, activity);

    if activity > rescale_limit() {
        rescale_clause_activities(ctx.borrow());
    }
}

/// Rescale all values to avoid an overflow.
fn rescale_clause_activities(
    mut ctx: partial!(Context, mut ClauseActivityP, mut ClauseAllocP),
) {
    let rescale_factor = 1.0 / rescale_limit();

    let (alloc, mut ctx) = ctx.split_part_mut(ClauseAllocP);
    for cref in alloc.refs().collect::<Vec<_>>() {
        let activity = alloc.activity(cref) * rescale_factor;
        alloc.set_activity(cref, activity);
    }
    ctx.part_mut(ClauseActivityP).bump *= rescale_factor;
}

/// Decay the clause activities.
pub fn decay_clause_activities(
    mut ctx: partial!(Context, mut ClauseActivityP, mut ClauseAllocP),
) {
    let activities = ctx.part_mut(ClauseActivityP);
    activities.bump *= activities.inv_decay;
    if activities.bump >= rescale_limit() {
        rescale_clause_activities(ctx.borrow());
    }
}
