//! Solver configuration.
use serde::Deserialize;

/// Configurable parameters used during solving.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Multiplicative VSIDS decay used when a learned clause's LBD is at
    /// least the running LBD average. (Default: 0.85)
    pub vsids_decay: f64,

    /// Gentler multiplicative VSIDS decay used when a learned clause's LBD is
    /// below the running LBD average. (Default: 0.99)
    pub vsids_thresh_decay: f64,

    /// Decay of the exponential moving average over learned clause LBD
    /// values. (Default: 0.95)
    pub lbd_ema_decay: f64,

    /// Multiplicative decay for clause activities. (Default: 0.999)
    pub clause_activity_decay: f32,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            vsids_decay: 0.85,
            vsids_thresh_decay: 0.99,
            lbd_ema_decay: 0.95,
            clause_activity_decay: 0.999,
        }
    }
}

/// Partial configuration, mergeable from TOML fragments.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverConfigUpdate {
    pub vsids_decay: Option<f64>,
    pub vsids_thresh_decay: Option<f64>,
    pub lbd_ema_decay: Option<f64>,
    pub clause_activity_decay: Option<f32>,
}

impl SolverConfigUpdate {
    pub fn new() -> SolverConfigUpdate {
        SolverConfigUpdate::default()
    }

    /// Merge another update into this one, later settings winning.
    pub fn merge(&mut self, other: SolverConfigUpdate) {
        if other.vsids_decay.is_some() {
            self.vsids_decay = other.vsids_decay;
        }
        if other.vsids_thresh_decay.is_some() {
            self.vsids_thresh_decay = other.vsids_thresh_decay;
        }
        if other.lbd_ema_decay.is_some() {
            self.lbd_ema_decay = other.lbd_ema_decay;
        }
        if other.clause_activity_decay.is_some() {
            self.clause_activity_decay = other.clause_activity_decay;
        }
    }
}

impl SolverConfig {
    /// Apply an update to this configuration.
    pub fn apply(&mut self, update: &SolverConfigUpdate) {
        if let Some(value) = update.vsids_decay {
            self.vsids_decay = value;
        }
        if let Some(value) = update.vsids_thresh_decay {
            self.vsids_thresh_decay = value;
        }
        if let Some(value) = update.lbd_ema_decay {
            self.lbd_ema_decay = value;
        }
        if let Some(value) = update.clause_activity_decay {
            self.clause_activity_decay = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_and_apply() {
        let mut config = SolverConfig::default();

        let mut update = SolverConfigUpdate::new();
        update.merge(SolverConfigUpdate {
            vsids_decay: Some(0.9),
            ..SolverConfigUpdate::default()
        });
        update.merge(SolverConfigUpdate {
            lbd_ema_decay: Some(0.8),
            ..SolverConfigUpdate::default()
        });

        config.apply(&update);
        assert_eq!(config.vsids_decay, 0.9);
        assert_eq!(config.lbd_ema_decay, 0.8);
        assert_eq!(config.vsids_thresh_decay, 0.99);
    }
}
