//! Mapping between variable names and solver variables.
use rustc_hash::FxHashMap;

use crate::lit::{Lit, Var};

/// Per-variable name record.
#[derive(Clone, Debug)]
struct NameEntry {
    name: String,
    /// Whether the name comes from the input formula rather than from a
    /// fresh auxiliary allocation.
    founder: bool,
}

/// Bidirectional map between variable names and [`Var`] values.
///
/// Variables are handed out densely starting at index 0. Names introduced by
/// the input are flagged as founder variables; auxiliaries allocated by the
/// Tseitin conversion get synthetic names of the form `[k]` and are excluded
/// from reported models.
#[derive(Clone, Debug, Default)]
pub struct VarMap {
    names: FxHashMap<String, Var>,
    entries: Vec<NameEntry>,
    fresh_name_id: u64,
}

impl VarMap {
    /// Create an empty mapping.
    pub fn new() -> VarMap {
        VarMap {
            names: FxHashMap::default(),
            entries: vec![],
            fresh_name_id: 1,
        }
    }

    /// Number of mapped variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no variable is mapped yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up or allocate the variable for a name.
    ///
    /// Idempotent: interning the same name twice returns the same variable.
    /// Names interned this way are founder variables.
    pub fn intern(&mut self, name: &str) -> Var {
        if let Some(&var) = self.names.get(name) {
            return var;
        }
        self.insert(name.to_owned(), true)
    }

    /// Allocate a fresh auxiliary variable.
    ///
    /// The synthetic name `[k]` cannot collide with interned names, which
    /// never contain brackets.
    pub fn fresh(&mut self) -> (String, Var) {
        let name = format!("[{}]", self.fresh_name_id);
        self.fresh_name_id += 1;
        let var = self.insert(name.clone(), false);
        (name, var)
    }

    fn insert(&mut self, name: String, founder: bool) -> Var {
        let var = Var::from_index(self.entries.len());
        self.names.insert(name.clone(), var);
        self.entries.push(NameEntry { name, founder });
        var
    }

    /// The variable mapped to a name, if present.
    pub fn var(&self, name: &str) -> Option<Var> {
        self.names.get(name).copied()
    }

    /// The raw name of a variable.
    pub fn name(&self, var: Var) -> &str {
        &self.entries[var.index()].name
    }

    /// Whether the variable's name comes from the input formula.
    pub fn is_founder(&self, var: Var) -> bool {
        self.entries[var.index()].founder
    }

    /// Display name of a literal, with a leading `-` for negative literals.
    pub fn display(&self, lit: Lit) -> String {
        let name = trim_name(self.name(lit.var()));
        if lit.is_negative() {
            format!("-{}", name)
        } else {
            name
        }
    }

    /// Iterate over all variables whose name comes from the input.
    pub fn founders(&self) -> impl Iterator<Item = (Var, &str)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            if entry.founder {
                Some((Var::from_index(index), entry.name.as_str()))
            } else {
                None
            }
        })
    }
}

/// Normalize a stored name for display.
///
/// Auxiliary names `[k]` render as `vark`. Interned names are stored as the
/// parsers deliver them, already unquoted, and are shown unchanged.
fn trim_name(name: &str) -> String {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'[' && bytes[bytes.len() - 1] == b']' {
        return format!("var{}", &name[1..name.len() - 1]);
    }
    name.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut map = VarMap::new();
        let x = map.intern("x");
        let y = map.intern("y");
        assert_ne!(x, y);
        assert_eq!(map.intern("x"), x);
        assert_eq!(map.intern("y"), y);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn name_roundtrip() {
        let mut map = VarMap::new();
        let x = map.intern("flip_flop");
        assert_eq!(map.name(x), "flip_flop");
        assert_eq!(map.var("flip_flop"), Some(x));
        let name = map.name(x).to_owned();
        assert_eq!(map.intern(&name), x);
    }

    #[test]
    fn fresh_vars_are_not_founders() {
        let mut map = VarMap::new();
        let x = map.intern("x");
        let (name, aux) = map.fresh();
        assert_eq!(name, "[1]");
        assert!(map.is_founder(x));
        assert!(!map.is_founder(aux));
        assert_ne!(x, aux);
        // Fresh ids never collide with interned names.
        assert_eq!(map.var("[1]"), Some(aux));
        let founders: Vec<_> = map.founders().collect();
        assert_eq!(founders, vec![(x, "x")]);
    }

    #[test]
    fn display_negative_literals() {
        let mut map = VarMap::new();
        let x = map.intern("x");
        let (_, aux) = map.fresh();
        assert_eq!(map.display(x.positive()), "x");
        assert_eq!(map.display(x.negative()), "-x");
        assert_eq!(map.display(aux.positive()), "var1");
    }
}
