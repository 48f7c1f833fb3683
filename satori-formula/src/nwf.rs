//! Negation-normal formulas.
//!
//! The NWF tree pushes negation inward: only And/Or nodes exist and each
//! carries a negation flag instead of explicit Not nodes. Implication and
//! biconditional are eliminated during conversion. Every binary node caches
//! its depth and complexity so the optimizer can make size-driven choices
//! without re-walking subtrees.
use crate::expr::Expr;
use crate::lit::Lit;
use crate::stats::FormulaStats;
use crate::vars::VarMap;

/// Maximum combined complexity for which the optimizer compares sibling
/// subtrees structurally.
const COLLAPSE_LIMIT: usize = 40;

/// A binary node of the NWF tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NwfNode {
    pub lhs: Nwf,
    pub rhs: Nwf,
    pub negated: bool,
    depth: usize,
    complexity: usize,
}

impl NwfNode {
    fn new(lhs: Nwf, rhs: Nwf, negated: bool) -> NwfNode {
        let (depth_l, complexity_l) = lhs.metrics();
        let (depth_r, complexity_r) = rhs.metrics();
        NwfNode {
            lhs,
            rhs,
            negated,
            depth: depth_l.max(depth_r) + 1,
            complexity: complexity_l + complexity_r,
        }
    }
}

/// A formula with negation pushed inward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Nwf {
    Var(Lit),
    Const(bool),
    And(Box<NwfNode>),
    Or(Box<NwfNode>),
}

impl Nwf {
    fn and(lhs: Nwf, rhs: Nwf, negated: bool) -> Nwf {
        Nwf::And(Box::new(NwfNode::new(lhs, rhs, negated)))
    }

    fn or(lhs: Nwf, rhs: Nwf, negated: bool) -> Nwf {
        Nwf::Or(Box::new(NwfNode::new(lhs, rhs, negated)))
    }

    /// Convert a free-form formula, interning its variable names.
    pub fn from_expr(expr: &Expr, vars: &mut VarMap) -> Nwf {
        match expr {
            Expr::Var(name) => Nwf::Var(vars.intern(name).positive()),
            Expr::Const(value) => Nwf::Const(*value),
            Expr::Not(arg) => {
                let mut converted = Nwf::from_expr(arg, vars);
                converted.negate();
                converted
            }
            Expr::And(lhs, rhs) => Nwf::and(
                Nwf::from_expr(lhs, vars),
                Nwf::from_expr(rhs, vars),
                false,
            ),
            Expr::Or(lhs, rhs) => Nwf::or(
                Nwf::from_expr(lhs, vars),
                Nwf::from_expr(rhs, vars),
                false,
            ),
            Expr::Implies(lhs, rhs) => {
                let mut premise = Nwf::from_expr(lhs, vars);
                premise.negate();
                Nwf::or(premise, Nwf::from_expr(rhs, vars), false)
            }
            Expr::Iff(lhs, rhs) => {
                let forward = {
                    let mut premise = Nwf::from_expr(lhs, vars);
                    premise.negate();
                    Nwf::or(premise, Nwf::from_expr(rhs, vars), false)
                };
                let backward = {
                    let mut premise = Nwf::from_expr(rhs, vars);
                    premise.negate();
                    Nwf::or(premise, Nwf::from_expr(lhs, vars), false)
                };
                Nwf::and(forward, backward, false)
            }
        }
    }

    /// Negate the formula in place.
    pub fn negate(&mut self) {
        match self {
            Nwf::Var(lit) => *lit = !*lit,
            Nwf::Const(value) => *value = !*value,
            Nwf::And(node) | Nwf::Or(node) => node.negated = !node.negated,
        }
    }

    /// Depth and complexity of this subtree.
    ///
    /// Complexity counts leaves; for binary nodes both values are cached.
    pub fn metrics(&self) -> (usize, usize) {
        match self {
            Nwf::Var(_) | Nwf::Const(_) => (1, 1),
            Nwf::And(node) | Nwf::Or(node) => (node.depth, node.complexity),
        }
    }

    /// Measure the formula for stage banners.
    pub fn measure(&self) -> FormulaStats {
        let (depth, complexity) = self.metrics();
        FormulaStats {
            depth,
            complexity,
            ..FormulaStats::default()
        }
    }

    /// Evaluate under a total assignment indexed by variable.
    pub fn evaluate(&self, assignment: &[bool]) -> bool {
        match self {
            Nwf::Var(lit) => lit.apply(assignment[lit.index()]),
            Nwf::Const(value) => *value,
            Nwf::And(node) => {
                (node.lhs.evaluate(assignment) && node.rhs.evaluate(assignment)) != node.negated
            }
            Nwf::Or(node) => {
                (node.lhs.evaluate(assignment) || node.rhs.evaluate(assignment)) != node.negated
            }
        }
    }

    /// Convert back to a free-form formula.
    pub fn to_expr(&self, vars: &VarMap) -> Expr {
        match self {
            Nwf::Var(lit) => {
                let var = Expr::var(vars.name(lit.var()));
                if lit.is_negative() {
                    Expr::not(var)
                } else {
                    var
                }
            }
            Nwf::Const(value) => Expr::Const(*value),
            Nwf::And(node) => {
                let expr = Expr::and(node.lhs.to_expr(vars), node.rhs.to_expr(vars));
                if node.negated {
                    Expr::not(expr)
                } else {
                    expr
                }
            }
            Nwf::Or(node) => {
                let expr = Expr::or(node.lhs.to_expr(vars), node.rhs.to_expr(vars));
                if node.negated {
                    Expr::not(expr)
                } else {
                    expr
                }
            }
        }
    }

    /// Canonical serialization used for structural comparison.
    ///
    /// Children are sorted so that commutative nodes serialize identically.
    fn serialize(&self) -> String {
        match self {
            Nwf::Var(lit) => lit.to_dimacs().to_string(),
            Nwf::Const(true) => "t".to_owned(),
            Nwf::Const(false) => "f".to_owned(),
            Nwf::And(node) => serialize_node(node, '*'),
            Nwf::Or(node) => serialize_node(node, '+'),
        }
    }

    /// Rewrite the formula to fixpoint.
    ///
    /// Folds constants through negation-flagged nodes and collapses
    /// structurally identical siblings of small combined complexity.
    pub fn optimize(self) -> Nwf {
        let mut formula = self;
        loop {
            let mut changed = false;
            formula = optimize_tree(formula, &mut changed);
            if !changed {
                return formula;
            }
        }
    }
}

fn serialize_node(node: &NwfNode, operator: char) -> String {
    let mut children = [node.lhs.serialize(), node.rhs.serialize()];
    children.sort();
    let (open, close) = if node.negated { ('{', '}') } else { ('(', ')') };
    format!("{}{}{}{}{}", open, children[0], operator, children[1], close)
}

/// One optimizer pass over a subtree.
fn optimize_tree(formula: Nwf, changed: &mut bool) -> Nwf {
    let (node, is_and) = match formula {
        Nwf::And(node) => (node, true),
        Nwf::Or(node) => (node, false),
        leaf => return leaf,
    };

    let negated = node.negated;
    let lhs = optimize_tree(node.lhs, changed);
    let rhs = optimize_tree(node.rhs, changed);

    // Two constant children fold to a constant outright.
    if let (&Nwf::Const(value_l), &Nwf::Const(value_r)) = (&lhs, &rhs) {
        *changed = true;
        let value = if is_and {
            value_l && value_r
        } else {
            value_l || value_r
        };
        return Nwf::Const(value != negated);
    }

    // A single constant child either decides the node or drops out as the
    // identity element.
    if let &Nwf::Const(value) = &lhs {
        *changed = true;
        if value != is_and {
            return Nwf::Const(value != negated);
        }
        let mut kept = rhs;
        if negated {
            kept.negate();
        }
        return kept;
    }
    if let &Nwf::Const(value) = &rhs {
        *changed = true;
        if value != is_and {
            return Nwf::Const(value != negated);
        }
        let mut kept = lhs;
        if negated {
            kept.negate();
        }
        return kept;
    }

    // Identical siblings collapse when cheap enough to compare.
    let (_, complexity_l) = lhs.metrics();
    let (_, complexity_r) = rhs.metrics();
    if complexity_l + complexity_r <= COLLAPSE_LIMIT && lhs.serialize() == rhs.serialize() {
        *changed = true;
        let mut kept = lhs;
        if negated {
            kept.negate();
        }
        return kept;
    }

    if is_and {
        Nwf::and(lhs, rhs, negated)
    } else {
        Nwf::or(lhs, rhs, negated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(expr: &Expr) -> (Nwf, VarMap) {
        let mut vars = VarMap::new();
        let nwf = Nwf::from_expr(expr, &mut vars);
        (nwf, vars)
    }

    #[test]
    fn implication_becomes_or() {
        let (nwf, vars) = convert(&Expr::implies(Expr::var("a"), Expr::var("b")));
        let a = vars.var("a").unwrap();
        let b = vars.var("b").unwrap();
        match nwf {
            Nwf::Or(node) => {
                assert!(!node.negated);
                assert_eq!(node.lhs, Nwf::Var(a.negative()));
                assert_eq!(node.rhs, Nwf::Var(b.positive()));
            }
            other => panic!("expected Or node, got {:?}", other),
        }
    }

    #[test]
    fn negation_is_pushed_inward() {
        let (nwf, vars) = convert(&Expr::not(Expr::and(Expr::var("a"), Expr::var("b"))));
        let a = vars.var("a").unwrap();
        match nwf {
            Nwf::And(node) => {
                assert!(node.negated);
                assert_eq!(node.lhs, Nwf::Var(a.positive()));
            }
            other => panic!("expected negated And node, got {:?}", other),
        }
    }

    #[test]
    fn constants_fold() {
        let (nwf, _) = convert(&Expr::and(Expr::var("a"), Expr::Const(false)));
        assert_eq!(nwf.optimize(), Nwf::Const(false));

        let (nwf, vars) = convert(&Expr::or(Expr::var("a"), Expr::Const(false)));
        let a = vars.var("a").unwrap();
        assert_eq!(nwf.optimize(), Nwf::Var(a.positive()));

        let (nwf, _) = convert(&Expr::not(Expr::or(Expr::var("a"), Expr::Const(true))));
        assert_eq!(nwf.optimize(), Nwf::Const(false));
    }

    #[test]
    fn identical_siblings_collapse() {
        let branch = Expr::and(Expr::var("a"), Expr::var("b"));
        let (nwf, vars) = convert(&Expr::or(branch.clone(), branch));
        let optimized = nwf.optimize();
        let a = vars.var("a").unwrap();
        match optimized {
            Nwf::And(node) => {
                assert!(!node.negated);
                assert_eq!(node.lhs, Nwf::Var(a.positive()));
            }
            other => panic!("expected collapsed And node, got {:?}", other),
        }
    }

    #[test]
    fn evaluate_matches_expr() {
        let expr = Expr::iff(
            Expr::var("a"),
            Expr::not(Expr::or(Expr::var("b"), Expr::Const(false))),
        );
        let (nwf, vars) = convert(&expr);
        let a = vars.var("a").unwrap();
        let b = vars.var("b").unwrap();
        for &value_a in &[false, true] {
            for &value_b in &[false, true] {
                let mut assignment = vec![false; 2];
                assignment[a.index()] = value_a;
                assignment[b.index()] = value_b;
                let expected = value_a == !value_b;
                assert_eq!(nwf.evaluate(&assignment), expected);
                assert_eq!(nwf.clone().optimize().evaluate(&assignment), expected);
            }
        }
    }

    #[test]
    fn roundtrip_to_expr_keeps_names() {
        let expr = Expr::not(Expr::and(Expr::var("x"), Expr::var("y")));
        let (nwf, vars) = convert(&expr);
        match nwf.to_expr(&vars) {
            Expr::Not(inner) => match *inner {
                Expr::And(lhs, _) => assert_eq!(*lhs, Expr::var("x")),
                other => panic!("expected And, got {:?}", other),
            },
            other => panic!("expected Not, got {:?}", other),
        }
    }
}
