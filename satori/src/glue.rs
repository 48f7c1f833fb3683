//! Computation of the LBD (literals block distance) of a clause.
use partial_ref::{partial, PartialRef};

use satori_formula::Lit;

use crate::context::{Context, ImplGraphP, TmpDataP};

/// Number of distinct decision levels among the clause's literals.
///
/// Levels are taken from the current assignment, so this is only meaningful
/// while every literal of the clause is assigned, e.g. for a freshly learned
/// clause before backtracking.
pub fn compute_lbd(
    mut ctx: partial!(Context, mut TmpDataP, ImplGraphP),
    lits: &[Lit],
) -> usize {
    let (tmp, ctx) = ctx.split_part_mut(TmpDataP);
    let graph = ctx.part(ImplGraphP);

    tmp.seen_levels.clear();
    for &lit in lits {
        tmp.seen_levels.insert(graph.level(lit.var()));
    }
    tmp.seen_levels.len()
}
