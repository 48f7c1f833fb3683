//! Temporary data.
use rustc_hash::FxHashSet;

use satori_formula::Lit;

/// Temporary data used by various parts of the solver.
///
/// Make sure to check any documented invariants when using this. Also make
/// sure to check all existing users when adding invariants.
#[derive(Default)]
pub struct TmpData {
    pub lits: Vec<Lit>,
    pub lits_2: Vec<Lit>,
    /// Scratch set of decision levels for LBD computation.
    ///
    /// Cleared before each use.
    pub seen_levels: FxHashSet<usize>,
}
