//! Unit propagation.
pub mod assignment;
pub mod graph;
pub mod watch;

pub use assignment::{backtrack, enqueue_assignment, Assignment, Trail};
pub use graph::{Conflict, ImplGraph, ImplNode, Reason};
pub use watch::{Watch, Watchlists};

use partial_ref::{partial, PartialRef};

use satori_formula::Lit;

use crate::context::{AssignmentP, ClauseAllocP, Context, ImplGraphP, TrailP, WatchlistsP};

/// Propagate all enqueued assignments.
///
/// Processes the trail in assignment order until it is fully propagated or a
/// clause becomes falsified, in which case that clause is returned as the
/// conflict.
pub fn propagate(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
    ),
) -> Result<(), Conflict> {
    while let Some(lit) = ctx.part_mut(TrailP).pop_queue() {
        propagate_assignment(ctx.borrow(), lit)?;
    }
    Ok(())
}

/// Process the watch list of a literal that became true.
///
/// The list under `lit` holds the clauses watching `!lit`. Watches whose
/// invariant still holds are kept; watches of clauses that found a
/// replacement literal move to that literal's list. A clause with no
/// replacement is unit (assert the other watched literal) or, if that
/// literal is false, a conflict. On conflict the unprocessed tail of the
/// list is preserved.
fn propagate_assignment(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
    ),
    lit: Lit,
) -> Result<(), Conflict> {
    let (watchlists, mut ctx) = ctx.split_part_mut(WatchlistsP);
    let (alloc, mut ctx) = ctx.split_part_mut(ClauseAllocP);

    let false_lit = !lit;

    let mut watches = watchlists.take(lit);
    let mut kept = Vec::with_capacity(watches.len());
    let mut pending = watches.drain(..);

    while let Some(watch) = pending.next() {
        // If the blocking literal (a literal of the clause different from
        // the watched one) is already true, the clause is satisfied and the
        // watch stays as it is.
        if ctx.part(AssignmentP).lit_is_true(watch.blocking) {
            kept.push(watch);
            continue;
        }

        let lits = alloc.lits_mut(watch.cref);

        // Keep the other watched literal in slot 0 so that a propagated
        // literal always ends up in the first position.
        if lits[0] == false_lit {
            lits.swap(0, 1);
        }
        let other = lits[0];
        debug_assert_eq!(lits[1], false_lit);

        let new_watch = Watch {
            cref: watch.cref,
            blocking: other,
        };

        // The other watched literal may satisfy the clause.
        if other != watch.blocking && ctx.part(AssignmentP).lit_is_true(other) {
            kept.push(new_watch);
            continue;
        }

        // Look for a non-false unwatched literal to take over this watch.
        let mut moved = false;
        for slot in 2..lits.len() {
            let candidate = lits[slot];
            if !ctx.part(AssignmentP).lit_is_false(candidate) {
                lits[1] = candidate;
                lits[slot] = false_lit;
                debug_assert_ne!(!candidate, lit);
                watchlists.add_watch(!candidate, new_watch);
                moved = true;
                break;
            }
        }
        if moved {
            continue;
        }

        // Every unwatched literal is false, so the clause is unit or
        // falsified under the current assignment.
        kept.push(new_watch);

        if ctx.part(AssignmentP).lit_is_false(other) {
            // Preserve the watches we did not get to before bailing out.
            kept.extend(pending);
            watchlists.put_back(lit, kept);
            return Err(Conflict { cref: watch.cref });
        }

        enqueue_assignment(ctx.borrow(), other, Reason::Clause(watch.cref));
    }

    watchlists.put_back(lit, kept);
    Ok(())
}
