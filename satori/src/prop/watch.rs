//! Watchlists to detect clauses that became unit.
//!
//! Every stored clause watches exactly two of its literals, kept in
//! positions 0 and 1. A watch for literal `l` of clause `C` is recorded in
//! the list under `!l`: when `!l` is assigned true, the watched literal
//! becomes false and the clauses in that list are the only ones whose
//! invariant can break. Each watch also carries a blocking literal of the
//! clause; when the blocking literal is true the clause is satisfied and the
//! clause data does not have to be touched at all.
//!
//! There is no need to update watchlists on backtracking, as unassigning
//! variables cannot invalidate the invariant.
use satori_formula::Lit;

use crate::clause::ClauseRef;

/// A watch on a clause.
#[derive(Copy, Clone)]
pub struct Watch {
    /// Clause that has the referring literal in position 0 or 1.
    pub cref: ClauseRef,
    /// A literal of the clause different from the watched literal.
    pub blocking: Lit,
}

/// Watchlists to detect clauses that became unit.
#[derive(Default)]
pub struct Watchlists {
    /// Indexed by literal code.
    watches: Vec<Vec<Watch>>,
}

impl Watchlists {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.watches.resize(count * 2, vec![]);
    }

    /// Start watching a clause.
    ///
    /// `lits` have to be the first two literals of the given clause.
    pub fn watch_clause(&mut self, cref: ClauseRef, lits: [Lit; 2]) {
        for i in 0..2 {
            let watch = Watch {
                cref,
                blocking: lits[i ^ 1],
            };
            self.add_watch(!lits[i], watch);
        }
    }

    /// Record a watch in the list of a literal.
    pub fn add_watch(&mut self, lit: Lit, watch: Watch) {
        self.watches[lit.code()].push(watch)
    }

    /// Take the watch list of a literal for a rebuild pass.
    pub fn take(&mut self, lit: Lit) -> Vec<Watch> {
        std::mem::take(&mut self.watches[lit.code()])
    }

    /// Install the rebuilt watch list of a literal.
    pub fn put_back(&mut self, lit: Lit, watches: Vec<Watch>) {
        debug_assert!(self.watches[lit.code()].is_empty());
        self.watches[lit.code()] = watches;
    }

    /// Watches currently registered for a literal.
    pub fn watched_by(&self, lit: Lit) -> &[Watch] {
        &self.watches[lit.code()]
    }
}
