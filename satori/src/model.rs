//! Extraction of the reported satisfying assignment.
use std::collections::BTreeMap;

use satori_formula::{Var, VarMap};

/// Restrict an assignment to founder variables, keyed by name.
///
/// Auxiliary variables introduced by the CNF conversion are dropped. The
/// `BTreeMap` keeps names in lexicographic order for rendering.
pub fn founder_model(
    vars: &VarMap,
    assignment: impl IntoIterator<Item = (Var, bool)>,
) -> BTreeMap<String, bool> {
    assignment
        .into_iter()
        .filter(|&(var, _)| var.index() < vars.len() && vars.is_founder(var))
        .map(|(var, value)| (vars.name(var).to_owned(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_auxiliaries() {
        let mut vars = VarMap::new();
        let x = vars.intern("x");
        let (_, aux) = vars.fresh();
        let y = vars.intern("y");

        let model = founder_model(&vars, vec![(x, true), (aux, false), (y, false)]);

        let entries: Vec<_> = model.into_iter().collect();
        assert_eq!(
            entries,
            vec![("x".to_owned(), true), ("y".to_owned(), false)]
        );
    }
}
