//! CNF simplification.
//!
//! Occurrence-indexed preprocessing of the CNF before it reaches the CDCL
//! engine: subsumption, self-subsumption, toplevel unit propagation,
//! blocked clause elimination, tautology and dangling variable removal.
//! Variable elimination has its candidate selection and cut-off in place but
//! the distribution step itself never runs.
//!
//! Unit clauses consumed by toplevel propagation are forced facts; they are
//! re-emitted into the simplified formula so the solver's model keeps their
//! assignments.
use log::debug;

use rustc_hash::FxHashSet;

use satori_formula::{CnfFormula, Lit, UnsatReason, Var, VarMap};

/// Index of a clause in the simplifier's arena.
type ClauseId = usize;

/// A clause under simplification.
///
/// Literals are kept sorted and deduplicated, so set operations are merge
/// walks. The signature is a Bloom mask over the clause's variables used as
/// a cheap necessary condition for subset tests.
struct SimpClause {
    lits: Vec<Lit>,
    signature: u64,
    deleted: bool,
}

impl SimpClause {
    fn rehash(&mut self) {
        self.signature = signature(&self.lits);
    }

    fn contains(&self, lit: Lit) -> bool {
        self.lits.binary_search(&lit).is_ok()
    }

    fn is_unit(&self) -> bool {
        self.lits.len() == 1
    }
}

/// Bloom mask over the variables of a literal set.
fn signature(lits: &[Lit]) -> u64 {
    lits.iter()
        .fold(0, |mask, lit| mask | 1u64 << (lit.index() % 63))
}

/// Whether sorted literal slice `a` is a subset of sorted slice `b`.
fn is_subset(a: &[Lit], b: &[Lit]) -> bool {
    let mut b_iter = b.iter();
    'outer: for &lit in a {
        for &other in b_iter.by_ref() {
            if other == lit {
                continue 'outer;
            }
        }
        return false;
    }
    true
}

/// Occurrence-indexed simplifier state.
struct Simplifier<'a> {
    vars: &'a VarMap,
    /// Clause arena; deleted clauses stay in place.
    clauses: Vec<SimpClause>,
    /// Clause ids mentioning each literal, indexed by literal code.
    occur: Vec<FxHashSet<ClauseId>>,
    /// Active unit clauses.
    singular: FxHashSet<ClauseId>,
    /// Clauses added since the last subsumption round.
    added: FxHashSet<ClauseId>,
    /// Clauses strengthened since the last self-subsumption round.
    strengthened: FxHashSet<ClauseId>,
    /// Variables whose clauses changed since the last elimination round.
    touched: FxHashSet<Var>,
    /// Literals already consumed by toplevel unit propagation.
    visited_units: FxHashSet<Lit>,
    /// Forced facts, re-emitted into the output formula.
    forced: Vec<Lit>,
    /// Whether the current outer pass changed anything.
    progress: bool,
}

impl<'a> Simplifier<'a> {
    fn build(cnf: &CnfFormula, vars: &'a VarMap) -> Simplifier<'a> {
        let mut simp = Simplifier {
            vars,
            clauses: vec![],
            occur: vec![FxHashSet::default(); vars.len().max(cnf.var_count()) * 2],
            singular: FxHashSet::default(),
            added: FxHashSet::default(),
            strengthened: FxHashSet::default(),
            touched: FxHashSet::default(),
            visited_units: FxHashSet::default(),
            forced: vec![],
            progress: false,
        };

        for clause in cnf.iter() {
            let mut lits = clause.to_vec();
            lits.sort_unstable();
            lits.dedup();

            let id = simp.clauses.len();
            for &lit in &lits {
                simp.occur[lit.code()].insert(id);
            }
            if lits.len() == 1 {
                simp.singular.insert(id);
            }
            simp.clauses.push(SimpClause {
                signature: signature(&lits),
                lits,
                deleted: false,
            });
        }

        simp
    }

    fn display_clause(&self, id: ClauseId) -> String {
        let lits: Vec<String> = self.clauses[id]
            .lits
            .iter()
            .map(|&lit| self.vars.display(lit))
            .collect();
        format!("({})", lits.join(" v "))
    }

    /// Mark a clause deleted and drop it from every index.
    fn remove_clause(&mut self, id: ClauseId) {
        self.clauses[id].deleted = true;
        for i in 0..self.clauses[id].lits.len() {
            let lit = self.clauses[id].lits[i];
            self.occur[lit.code()].remove(&id);
            self.touched.insert(lit.var());
        }
        self.singular.remove(&id);
        self.progress = true;
    }

    /// Remove a literal from a clause.
    ///
    /// Fails with the strengthening UNSAT reason if the clause would become
    /// empty; the clause is left untouched in that case.
    fn strengthen(&mut self, id: ClauseId, lit: Lit) -> Result<(), UnsatReason> {
        if self.clauses[id].is_unit() {
            return Err(UnsatReason::Strengthening {
                clause: self.display_clause(id),
                var: self.vars.display(lit),
            });
        }

        let position = self.clauses[id]
            .lits
            .binary_search(&lit)
            .expect("strengthened literal not present in clause");
        self.clauses[id].lits.remove(position);
        self.occur[lit.code()].remove(&id);
        self.clauses[id].rehash();

        if self.clauses[id].is_unit() {
            self.singular.insert(id);
        }

        for i in 0..self.clauses[id].lits.len() {
            let var = self.clauses[id].lits[i].var();
            self.touched.insert(var);
        }
        self.strengthened.insert(id);
        self.progress = true;

        Ok(())
    }

    /// Active clauses subsumed by the given literal set.
    ///
    /// Candidates come from the occurrence list of the set's rarest literal.
    /// Clauses with exactly the same literal set do not count as subsumed,
    /// and neither does the excluded clause itself.
    fn find_subsumed(
        &self,
        lits: &[Lit],
        sig: u64,
        exclude: Option<ClauseId>,
    ) -> Vec<ClauseId> {
        let best = match lits
            .iter()
            .min_by_key(|lit| self.occur[lit.code()].len())
        {
            Some(&lit) => lit,
            None => return vec![],
        };

        let mut result = vec![];
        for &cid in &self.occur[best.code()] {
            if exclude == Some(cid) {
                continue;
            }
            let candidate = &self.clauses[cid];
            if candidate.deleted
                || lits.len() > candidate.lits.len()
                || lits == &candidate.lits[..]
                || sig & !candidate.signature != 0
            {
                continue;
            }
            if is_subset(lits, &candidate.lits) {
                result.push(cid);
            }
        }
        result
    }

    /// Remove every clause subsumed by the given one.
    fn subsume(&mut self, id: ClauseId) {
        let lits = self.clauses[id].lits.clone();
        let sig = self.clauses[id].signature;
        for cid in self.find_subsumed(&lits, sig, Some(id)) {
            self.remove_clause(cid);
        }
    }

    /// Strengthen other clauses using this clause with one literal negated.
    ///
    /// If the clause with `l` flipped to `!l` subsumes some clause, that
    /// clause also holds without `!l` and loses it.
    fn self_subsume(&mut self, id: ClauseId) -> Result<(), UnsatReason> {
        let lits = self.clauses[id].lits.clone();
        let sig = self.clauses[id].signature;

        for &lit in &lits {
            let mut negated: Vec<Lit> = lits
                .iter()
                .map(|&other| if other == lit { !lit } else { other })
                .collect();
            negated.sort_unstable();

            // The signature tracks variables only, so it is unchanged by
            // negating a literal.
            for cid in self.find_subsumed(&negated, sig, None) {
                self.strengthen(cid, !lit)?;
            }
        }

        Ok(())
    }

    /// Propagate one pending toplevel unit clause.
    ///
    /// Returns whether a unit was processed. Finding both a literal and its
    /// negation as unit clauses is an UNSAT result.
    fn try_unit_propagation(&mut self) -> Result<bool, UnsatReason> {
        let mut pending = None;
        for &cid in &self.singular {
            let clause = &self.clauses[cid];
            if !clause.deleted && !self.visited_units.contains(&clause.lits[0]) {
                pending = Some(clause.lits[0]);
                break;
            }
        }
        let lit = match pending {
            Some(lit) => lit,
            None => return Ok(false),
        };

        self.visited_units.insert(lit);

        for &cid in &self.occur[(!lit).code()] {
            if !self.clauses[cid].deleted && self.clauses[cid].is_unit() {
                return Err(UnsatReason::UnitPropagation);
            }
        }

        self.forced.push(lit);

        let with_negation: Vec<ClauseId> = self.occur[(!lit).code()].iter().cloned().collect();
        for cid in with_negation {
            if !self.clauses[cid].deleted {
                self.strengthen(cid, !lit).map_err(|reason| {
                    reason.trace(format!(
                        "when performing unit propagation for {}",
                        self.vars.display(lit)
                    ))
                })?;
            }
        }

        let with_lit: Vec<ClauseId> = self.occur[lit.code()].iter().cloned().collect();
        for cid in with_lit {
            if !self.clauses[cid].deleted {
                self.remove_clause(cid);
            }
        }

        Ok(true)
    }

    /// Remove clauses containing a literal and its negation.
    fn remove_trivial_tautologies(&mut self) -> bool {
        let mut changed = false;
        for id in 0..self.clauses.len() {
            if self.clauses[id].deleted {
                continue;
            }
            let tautological = self.clauses[id]
                .lits
                .windows(2)
                .any(|pair| pair[0].var() == pair[1].var());
            if tautological {
                self.remove_clause(id);
                changed = true;
            }
        }
        changed
    }

    /// Remove clauses blocked on one of their literals.
    ///
    /// A clause `C` is blocked on `l` if every resolvent of `C` on `l` is a
    /// tautology. Removing it cannot change satisfiability.
    fn blocked_clause_elimination(&mut self) -> bool {
        let mut changed = false;
        for code in 0..self.occur.len() {
            let lit = Lit::from_code(code);
            let with_lit: Vec<ClauseId> = self.occur[code].iter().cloned().collect();
            for cid in with_lit {
                if self.clauses[cid].deleted || self.occur[(!lit).code()].is_empty() {
                    continue;
                }
                let mut blocked = true;
                for &did in &self.occur[(!lit).code()] {
                    let other = &self.clauses[did];
                    let tautology = self.clauses[cid]
                        .lits
                        .iter()
                        .any(|&q| q != lit && other.contains(!q));
                    if !tautology {
                        blocked = false;
                        break;
                    }
                }
                if blocked {
                    self.remove_clause(cid);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Remove the clauses of variables occurring in only one phase.
    fn remove_dangling_variables(&mut self) -> bool {
        let mut pure: Vec<Lit> = vec![];
        for code in 0..self.occur.len() {
            let lit = Lit::from_code(code);
            if !self.occur[code].is_empty() && self.occur[(!lit).code()].is_empty() {
                pure.push(lit);
            }
        }

        if pure.is_empty() {
            return false;
        }

        for lit in pure {
            let with_lit: Vec<ClauseId> = self.occur[lit.code()].iter().cloned().collect();
            for cid in with_lit {
                if !self.clauses[cid].deleted {
                    self.remove_clause(cid);
                }
            }
        }
        true
    }

    /// Bounded variable elimination hook.
    ///
    /// Variables with long occurrence lists are skipped to avoid quadratic
    /// blowup. The distribution step below is a no-op.
    fn maybe_eliminate(&mut self, var: Var) {
        if self.occur[var.positive().code()].len() > 10
            || self.occur[var.negative().code()].len() > 10
        {
            return; // heuristic cut-off
        }
        self.distribute(var);
    }

    /// Distribution step of variable elimination, intentionally not
    /// implemented. When implemented it must never increase the clause
    /// count on net.
    fn distribute(&mut self, _var: Var) {}

    /// Repeat unit propagation, tautology removal, blocked clause
    /// elimination and dangling variable removal until none of them fires.
    fn cleanup(&mut self) -> Result<(), UnsatReason> {
        loop {
            let propagated = self.try_unit_propagation()?;
            let tautologies = self.remove_trivial_tautologies();
            let blocked = self.blocked_clause_elimination();
            let dangling = self.remove_dangling_variables();
            if !(propagated || tautologies || blocked || dangling) {
                return Ok(());
            }
        }
    }

    /// The simplification driver loop.
    ///
    /// Alternates self-subsumption to fixpoint, subsumption of the added
    /// clauses with a positive literal, the variable elimination hook and
    /// the cleanup loop, until an outer pass makes no change at all.
    fn run(&mut self) -> Result<(), UnsatReason> {
        self.touched = self
            .clauses
            .iter()
            .filter(|clause| !clause.deleted)
            .flat_map(|clause| clause.lits.iter().map(|lit| lit.var()))
            .collect();
        self.added = (0..self.clauses.len())
            .filter(|&id| !self.clauses[id].deleted)
            .collect();
        self.strengthened.clear();

        loop {
            self.progress = false;

            let subsumption_candidates: Vec<ClauseId> = self
                .added
                .iter()
                .cloned()
                .filter(|&id| {
                    !self.clauses[id].deleted
                        && self.clauses[id].lits.iter().any(|lit| lit.is_positive())
                })
                .collect();

            loop {
                let round: Vec<ClauseId> = self
                    .added
                    .union(&self.strengthened)
                    .cloned()
                    .collect();
                self.added.clear();
                self.strengthened.clear();

                for id in round {
                    if !self.clauses[id].deleted {
                        self.self_subsume(id)?;
                    }
                }

                if self.strengthened.is_empty() {
                    break;
                }
            }

            for id in subsumption_candidates {
                if !self.clauses[id].deleted {
                    self.subsume(id);
                }
            }

            loop {
                let round: Vec<Var> = self.touched.drain().collect();
                for var in round {
                    self.maybe_eliminate(var);
                }
                if self.touched.is_empty() {
                    break;
                }
            }

            self.cleanup()?;

            if !self.progress && self.added.is_empty() {
                return Ok(());
            }
        }
    }

    /// Build the simplified formula from forced facts and surviving clauses.
    fn into_formula(self) -> CnfFormula {
        let mut formula = CnfFormula::new();
        formula.set_var_count(self.vars.len());

        for &lit in &self.forced {
            formula.add_clause([lit].iter().cloned());
        }
        for clause in &self.clauses {
            if !clause.deleted {
                formula.add_clause(clause.lits.iter().cloned());
            }
        }

        formula
    }
}

/// Simplify a CNF formula.
///
/// Returns the simplified formula, equisatisfiable with the input over the
/// founder variables, or the UNSAT reason if simplification already decides
/// the formula.
pub fn simplify(cnf: &CnfFormula, vars: &VarMap) -> Result<CnfFormula, UnsatReason> {
    let mut simplifier = Simplifier::build(cnf, vars);
    simplifier.run()?;
    let simplified = simplifier.into_formula();

    debug!(
        "simplification reduced {} clauses to {}",
        cnf.len(),
        simplified.len()
    );

    Ok(simplified)
}

#[cfg(test)]
mod tests {
    use super::*;

    use satori_formula::{cnf_formula, lit};

    fn test_vars(count: usize) -> VarMap {
        let mut vars = VarMap::new();
        for i in 0..count {
            vars.intern(&format!("v{}", i));
        }
        vars
    }

    fn active_clauses(simp: &Simplifier) -> Vec<Vec<Lit>> {
        simp.clauses
            .iter()
            .filter(|clause| !clause.deleted)
            .map(|clause| clause.lits.clone())
            .collect()
    }

    #[test]
    fn subsume_removes_supersets() {
        let cnf = cnf_formula![
            1, 2;
            1, 2, 3;
            1, 3;
        ];
        let vars = test_vars(3);
        let mut simp = Simplifier::build(&cnf, &vars);

        simp.subsume(0);

        let remaining = active_clauses(&simp);
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&vec![lit!(1), lit!(2)]));
        assert!(remaining.contains(&vec![lit!(1), lit!(3)]));
    }

    #[test]
    fn subsume_keeps_duplicates() {
        let cnf = cnf_formula![
            1, 2;
            1, 2;
        ];
        let vars = test_vars(2);
        let mut simp = Simplifier::build(&cnf, &vars);

        simp.subsume(0);

        assert_eq!(active_clauses(&simp).len(), 2);
    }

    #[test]
    fn self_subsume_strengthens() {
        let cnf = cnf_formula![
            1, 2;
            -1, 2, 3;
        ];
        let vars = test_vars(3);
        let mut simp = Simplifier::build(&cnf, &vars);

        simp.self_subsume(0).unwrap();

        let remaining = active_clauses(&simp);
        assert!(remaining.contains(&vec![lit!(2), lit!(3)]));
    }

    #[test]
    fn unit_propagation_strengthens_and_removes() {
        let cnf = cnf_formula![
            1;
            -1, 2;
            1, 3;
        ];
        let vars = test_vars(3);
        let mut simp = Simplifier::build(&cnf, &vars);

        assert!(simp.try_unit_propagation().unwrap());
        assert_eq!(simp.forced, vec![lit!(1)]);

        // Propagating the forced literal turned -1 2 into the unit 2.
        assert!(simp.try_unit_propagation().unwrap());
        assert_eq!(simp.forced, vec![lit!(1), lit!(2)]);

        assert!(!simp.try_unit_propagation().unwrap());
        assert!(active_clauses(&simp).is_empty());
    }

    #[test]
    fn strengthening_a_unit_clause_is_unsat() {
        let mut vars = VarMap::new();
        vars.intern("x");
        vars.fresh();

        let cnf = cnf_formula![
            -1;
            2;
        ];
        let mut simp = Simplifier::build(&cnf, &vars);

        let reason = simp.strengthen(0, lit!(-1)).unwrap_err();
        assert_eq!(
            reason.to_string(),
            "strengthening clause (-x) by variable -x produced an empty clause"
        );

        // Auxiliary names render through their display form.
        let reason = simp.strengthen(1, lit!(2)).unwrap_err();
        assert_eq!(
            reason.to_string(),
            "strengthening clause (var1) by variable var1 produced an empty clause"
        );

        // The failed operation leaves the clauses untouched.
        assert_eq!(active_clauses(&simp), vec![vec![lit!(-1)], vec![lit!(2)]]);
    }

    #[test]
    fn contradicting_units_are_unsat() {
        let cnf = cnf_formula![
            1;
            -1;
        ];
        let vars = test_vars(1);
        let result = simplify(&cnf, &vars);
        assert_eq!(result.unwrap_err().root(), &UnsatReason::UnitPropagation);
    }

    #[test]
    fn forced_units_survive_into_output() {
        let cnf = cnf_formula![
            1;
            -1, 2;
        ];
        let vars = test_vars(2);
        let simplified = simplify(&cnf, &vars).unwrap();

        let clauses: Vec<Vec<Lit>> = simplified.iter().map(|c| c.to_vec()).collect();
        assert!(clauses.contains(&vec![lit!(1)]));
        assert!(clauses.contains(&vec![lit!(2)]));
    }

    #[test]
    fn tautologies_are_removed() {
        let cnf = cnf_formula![
            1, -1, 2;
            2, 3;
        ];
        let vars = test_vars(3);
        let mut simp = Simplifier::build(&cnf, &vars);

        assert!(simp.remove_trivial_tautologies());
        assert_eq!(active_clauses(&simp).len(), 1);
    }

    #[test]
    fn blocked_clauses_are_removed() {
        // (1 2) is blocked on 2: the only resolvent, with (-2 -1), is a
        // tautology on 1.
        let cnf = cnf_formula![
            1, 2;
            -2, -1;
        ];
        let vars = test_vars(2);
        let mut simp = Simplifier::build(&cnf, &vars);

        assert!(simp.blocked_clause_elimination());
    }

    #[test]
    fn dangling_variables_are_removed() {
        let cnf = cnf_formula![
            1, 2;
            1, 3;
            -2, 3;
        ];
        let vars = test_vars(3);
        let mut simp = Simplifier::build(&cnf, &vars);

        // 1 and 3 occur in one phase only.
        assert!(simp.remove_dangling_variables());
        assert!(active_clauses(&simp).is_empty());
    }

    #[test]
    fn already_simplified_formula_is_untouched() {
        let cnf = cnf_formula![
            1, 2, -3;
            -1, 2, 3;
            1, -2, 3;
            -1, -2, -3;
            1, 2, 3;
            -1, -2, 3;
            -1, 2, -3;
            1, -2, -3;
        ];
        let vars = test_vars(3);
        let result = simplify(&cnf, &vars);
        // All eight clauses over three variables: unsatisfiable, but none of
        // the syntactic rules applies, so the formula passes through.
        let simplified = result.unwrap();
        assert_eq!(simplified.len(), 8);
    }
}
