use crate::{
    engine::{BannerParams, RampParams},
    simulation::{SimBudget, SimParams, TrialGoal},
    soft_pity::Easing,
};
use serde::{Deserialize, Serialize};

fn default_trials() -> i64 {
    100_000
}

/// A complete simulation run as read from a JSON file.
///
/// ```json
/// {
///   "params": { "p_base": 0.006, "pity": 90,
///               "ramp": { "start_at": 73, "target_prob": 0.5 },
///               "banner": { "off_probs": [0.5], "max_off": 1 } },
///   "goal": "first_up",
///   "trials": 200000,
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub params: SimParams,
    #[serde(default)]
    pub goal: TrialGoal,
    #[serde(default = "default_trials")]
    pub trials: i64,
    #[serde(default)]
    pub budget: Option<SimBudget>,
    /// Absent means an entropy-seeded, non-reproducible run.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RunConfig {
    /// Load a run config from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Invalid run config {path}: {e}"))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// A typical limited banner: 0.6% base, hard pity at 90, soft pity from
    /// draw 74, 50/50 with the guarantee armed after two straight losses.
    /// For tests.
    pub fn default_test() -> Self {
        let params = SimParams {
            p_base: 0.006,
            pity: 90,
            ramp: Some(RampParams {
                start_at: Some(73),
                start_pct: None,
                target_prob: 0.5,
                easing: Easing::Linear,
            }),
            banner: Some(BannerParams {
                off_probs: vec![0.5],
                max_off: 1,
            }),
            cushion: 0,
        };
        Self {
            params,
            goal: TrialGoal::FirstUp,
            trials: 10_000,
            budget: None,
            seed: Some(42),
        }
    }
}
