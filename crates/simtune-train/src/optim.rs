//! Optimizer construction handed to the backend.

use serde::{Deserialize, Serialize};
use simtune_settings::types::{OptimizerSettings, SchedulerInterval};

use crate::schedule::LinearWarmupSchedule;

/// `AdamW` hyper-parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdamWConfig {
    /// Peak learning rate.
    pub lr: f64,
    /// Decoupled weight decay.
    pub weight_decay: f64,
    /// Moment decay rates.
    pub betas: [f64; 2],
    /// Denominator epsilon.
    pub eps: f64,
}

impl AdamWConfig {
    /// Copy the optimizer fields out of settings.
    pub fn from_settings(s: &OptimizerSettings) -> Self {
        Self {
            lr: s.lr,
            weight_decay: s.weight_decay,
            betas: s.betas,
            eps: s.eps,
        }
    }
}

/// What `configure_optimizers` returns: the optimizer and its per-step schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerPlan {
    /// Optimizer hyper-parameters.
    pub optimizer: AdamWConfig,
    /// Learning-rate schedule.
    pub schedule: LinearWarmupSchedule,
    /// Whether the schedule advances per optimizer step or per epoch.
    pub interval: SchedulerInterval,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_settings_copies_fields() {
        let c = AdamWConfig::from_settings(&OptimizerSettings::default());
        assert_eq!(c.lr, 5e-5);
        assert_eq!(c.weight_decay, 0.001);
        assert_eq!(c.betas, [0.9, 0.999]);
        assert_eq!(c.eps, 1e-8);
    }

    #[test]
    fn plan_serializes_camel_case() {
        let plan = OptimizerPlan {
            optimizer: AdamWConfig::from_settings(&OptimizerSettings::default()),
            schedule: LinearWarmupSchedule::new(5e-5, 5, 500),
            interval: SchedulerInterval::Epoch,
        };
        let v = serde_json::to_value(&plan).unwrap();
        assert_eq!(v["optimizer"]["weightDecay"], 0.001);
        assert_eq!(v["schedule"]["warmupSteps"], 5);
        assert_eq!(v["schedule"]["totalSteps"], 500);
        assert_eq!(v["interval"], "epoch");
    }
}
