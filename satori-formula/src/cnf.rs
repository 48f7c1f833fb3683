//! CNF formulas.
use std::cmp::max;
use std::fmt;
use std::iter::Extend;
use std::ops::Range;

use crate::lit::{Lit, Var};
use crate::stats::FormulaStats;

/// A formula in conjunctive normal form.
///
/// Equivalent to a `Vec<Vec<Lit>>` but stores all literals in one buffer with
/// a range per clause.
#[derive(Default, Eq, Clone)]
pub struct CnfFormula {
    var_count: usize,
    literals: Vec<Lit>,
    clause_ranges: Vec<Range<usize>>,
}

impl CnfFormula {
    /// Create an empty CNF formula.
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// Number of variables in the formula.
    ///
    /// Counts gaps: if a variable is present, all variables of smaller index
    /// are counted too, so a vector of this length can be indexed by any
    /// variable of the formula.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Increase the variable count to at least the given value.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = max(self.var_count, count)
    }

    /// Number of clauses in the formula.
    pub fn len(&self) -> usize {
        self.clause_ranges.len()
    }

    /// Whether the formula has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clause_ranges.is_empty()
    }

    /// Append a clause to the formula.
    pub fn add_clause<L>(&mut self, literals: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        let begin = self.literals.len();
        self.literals.extend(literals);
        let end = self.literals.len();

        for &lit in self.literals[begin..end].iter() {
            self.var_count = max(lit.index() + 1, self.var_count);
        }

        self.clause_ranges.push(begin..end);
    }

    /// Iterator over all clauses.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        let literals = &self.literals;
        self.clause_ranges
            .iter()
            .map(move |range| &literals[range.clone()])
    }

    /// Evaluate the formula under a total assignment indexed by variable.
    pub fn evaluate(&self, assignment: &[bool]) -> bool {
        self.iter().all(|clause| {
            clause
                .iter()
                .any(|&lit| lit.apply(assignment[lit.index()]))
        })
    }

    /// Renumber the variables of the formula densely.
    ///
    /// Returns the renumbered formula together with a table mapping each new
    /// variable index back to the original variable. Returns `None` if the
    /// formula contains an empty clause, in which case no renumbering makes
    /// sense as the formula is unsatisfiable.
    pub fn normalize_vars(&self) -> Option<(CnfFormula, Vec<Var>)> {
        let mut forward: Vec<Option<Var>> = vec![None; self.var_count];
        let mut back: Vec<Var> = vec![];
        let mut normalized = CnfFormula::new();

        for clause in self.iter() {
            if clause.is_empty() {
                return None;
            }
            let lits: Vec<Lit> = clause
                .iter()
                .map(|&lit| {
                    let slot = &mut forward[lit.index()];
                    let var = *slot.get_or_insert_with(|| {
                        let var = Var::from_index(back.len());
                        back.push(lit.var());
                        var
                    });
                    var.lit(lit.is_positive())
                })
                .collect();
            normalized.add_clause(lits);
        }
        normalized.set_var_count(back.len());

        Some((normalized, back))
    }

    /// Measure the formula for stage banners.
    pub fn measure(&self) -> FormulaStats {
        let mut seen = vec![false; self.var_count];
        let mut variable_count = 0;
        let mut literal_count = 0;
        for clause in self.iter() {
            literal_count += clause.len();
            for &lit in clause {
                if !seen[lit.index()] {
                    seen[lit.index()] = true;
                    variable_count += 1;
                }
            }
        }
        FormulaStats {
            variable_count,
            clause_count: self.len(),
            literal_count,
            depth: 2,
            complexity: literal_count,
        }
    }
}

/// Convert any iterable of [`Lit`] iterables into a `CnfFormula`.
impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(formula: F) -> CnfFormula {
        let mut cnf_formula = CnfFormula::new();
        for clause in formula {
            cnf_formula.add_clause(clause);
        }
        cnf_formula
    }
}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.var_count(), f)?;
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for CnfFormula {
    fn eq(&self, other: &CnfFormula) -> bool {
        self.var_count() == other.var_count()
            && self.clause_ranges.len() == other.clause_ranges.len()
            && self
                .clause_ranges
                .iter()
                .zip(other.clause_ranges.iter())
                .all(|(range_a, range_b)| {
                    self.literals[range_a.clone()] == other.literals[range_b.clone()]
                })
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    pub fn vec_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = Vec<Vec<Lit>>> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        // Not using ind_flat_map makes shrinking too expensive
        vars.prop_ind_flat_map(move |vars| {
            collection::vec(
                collection::vec(lit(0..vars), clause_len.clone()),
                clauses.clone(),
            )
        })
    }

    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        vec_formula(vars, clauses, clause_len)
            .prop_map(|clauses| CnfFormula::from(clauses.iter().map(|c| c.iter().cloned())))
    }
}
