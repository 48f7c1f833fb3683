//! The adaptive VSIDS branching heuristic.
//!
//! VSIDS (Variable State Independent Decaying Sum) keeps an activity value
//! per variable. Variables involved in a conflict are bumped by a constant,
//! and after each conflict all activities decay. Decisions branch on the
//! unassigned variable of highest activity.
//!
//! Instead of decaying every activity after each conflict, the bump value is
//! divided by the decay factor; when any value would overflow, all
//! activities and the bump are rescaled. Only the order of activities
//! matters, so the common scaling factor is irrelevant.
//!
//! The adaptive part selects between two decay rates per conflict: learned
//! clauses whose LBD is at least the running LBD average use the aggressive
//! rate, better-than-average clauses use the gentler one. The running
//! average is an exponential moving average over the LBD of learned clauses.
use ordered_float::OrderedFloat;

use satori_formula::Var;

use crate::config::SolverConfig;

/// Rescale activities if any value exceeds this value.
const RESCALE_LIMIT: f64 = 1e100;

/// The adaptive VSIDS branching heuristic.
pub struct Vsids {
    /// The activity of each variable.
    activity: Vec<OrderedFloat<f64>>,
    /// A binary max-heap of the variables.
    heap: Vec<Var>,
    /// The position in the binary heap for each variable.
    position: Vec<Option<usize>>,
    /// The value to add on bumping.
    bump: f64,
    /// Exponential moving average over the LBD of learned clauses.
    lbd_ema: f64,
}

impl Default for Vsids {
    fn default() -> Vsids {
        Vsids {
            activity: vec![],
            heap: vec![],
            position: vec![],
            bump: 1.0,
            lbd_ema: 0.0,
        }
    }
}

impl Vsids {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        let old_count = self.activity.len();
        debug_assert!(!self.heap.iter().any(|&v| v.index() >= count));
        self.activity.resize(count, OrderedFloat(0.0));
        self.position.resize(count, None);

        for i in old_count..count {
            self.make_available(Var::from_index(i));
        }
    }

    /// Bump a variable by increasing its activity.
    pub fn bump(&mut self, var: Var) {
        let rescale = {
            let value = &mut self.activity[var.index()];
            value.0 += self.bump;
            value.0 > RESCALE_LIMIT
        };
        if rescale {
            self.rescale();
        }
        if let Some(pos) = self.position[var.index()] {
            self.sift_up(pos);
        }
    }

    /// Note a learned clause and decay all activities adaptively.
    ///
    /// The decay rate depends on how the clause's LBD compares to the
    /// running average, which is updated afterwards.
    pub fn note_learned_clause(&mut self, lbd: f64, config: &SolverConfig) {
        let decay = if lbd >= self.lbd_ema {
            config.vsids_decay
        } else {
            config.vsids_thresh_decay
        };
        self.lbd_ema = config.lbd_ema_decay * self.lbd_ema + (1.0 - config.lbd_ema_decay) * lbd;

        self.bump *= 1.0 / decay;
        if self.bump > RESCALE_LIMIT {
            self.rescale();
        }
    }

    /// Rescale all values to avoid an overflow.
    fn rescale(&mut self) {
        let rescale_factor = 1.0 / RESCALE_LIMIT;
        for activity in &mut self.activity {
            activity.0 *= rescale_factor;
        }
        self.bump *= rescale_factor;
    }

    /// Insert a variable into the heap if not already present.
    pub fn make_available(&mut self, var: Var) {
        if self.position[var.index()].is_none() {
            let position = self.heap.len();
            self.position[var.index()] = Some(position);
            self.heap.push(var);
            self.sift_up(position);
        }
    }

    /// Remove and return the variable of highest activity.
    pub fn pop(&mut self) -> Option<Var> {
        if self.heap.is_empty() {
            None
        } else {
            let var = self.heap.swap_remove(0);
            if !self.heap.is_empty() {
                let top_var = self.heap[0];
                self.position[top_var.index()] = Some(0);
                self.sift_down(0);
            }
            self.position[var.index()] = None;
            Some(var)
        }
    }

    /// Move a variable closer to the root until the heap property holds.
    fn sift_up(&mut self, mut pos: usize) {
        let var = self.heap[pos];
        loop {
            if pos == 0 {
                return;
            }
            let parent_pos = (pos - 1) / 2;
            let parent_var = self.heap[parent_pos];
            if self.activity[parent_var.index()] >= self.activity[var.index()] {
                return;
            }
            self.position[var.index()] = Some(parent_pos);
            self.heap[parent_pos] = var;
            self.position[parent_var.index()] = Some(pos);
            self.heap[pos] = parent_var;
            pos = parent_pos;
        }
    }

    /// Move a variable away from the root until the heap property holds.
    fn sift_down(&mut self, mut pos: usize) {
        let var = self.heap[pos];
        loop {
            let mut largest_pos = pos;
            let mut largest_var = var;

            let left_pos = pos * 2 + 1;
            if left_pos < self.heap.len() {
                let left_var = self.heap[left_pos];

                if self.activity[largest_var.index()] < self.activity[left_var.index()] {
                    largest_pos = left_pos;
                    largest_var = left_var;
                }
            }

            let right_pos = pos * 2 + 2;
            if right_pos < self.heap.len() {
                let right_var = self.heap[right_pos];

                if self.activity[largest_var.index()] < self.activity[right_var.index()] {
                    largest_pos = right_pos;
                    largest_var = right_var;
                }
            }

            if largest_pos == pos {
                return;
            }

            self.position[var.index()] = Some(largest_pos);
            self.heap[largest_pos] = var;
            self.position[largest_var.index()] = Some(pos);
            self.heap[pos] = largest_var;
            pos = largest_pos;
        }
    }
}
