//! Monte Carlo runner.
//!
//! Every trial builds a fresh engine from the same immutable SimParams,
//! seeds the cushion, and drives the engine until the goal's stopping rule.
//! One integer sample per trial feeds Stats.
//!
//! RULES:
//!   - Trials share nothing but `&SimParams`. Each owns its engine and stream.
//!   - Seeded runs derive stream i from (master seed, i), so the sample
//!     vector is identical regardless of thread count or scheduling.
//!   - A config error aborts the whole run; there are no partial results.

use crate::{
    engine::{BannerParams, EngineSpec, RampParams},
    error::GachaResult,
    rng::{EntropySource, RandomSource, TrialRngBank},
    stats::Stats,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Upper bound on draws in one open-ended trial. Only reachable when pity is
/// disabled and the hit probability is 0.
pub const TRIAL_DRAW_CAP: u32 = 1_000_000;

/// Measurement rule for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialGoal {
    /// Draws until the first hit.
    FirstHit,
    /// Draws until the first UP. Same as FirstHit without a banner.
    #[default]
    FirstUp,
    /// Hits (UPs with a banner) within a fixed number of draws.
    FixedBudget,
}

impl TrialGoal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstHit => "first_hit",
            Self::FirstUp => "first_up",
            Self::FixedBudget => "fixed_budget",
        }
    }
}

impl fmt::Display for TrialGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrialGoal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "first_hit" => Ok(Self::FirstHit),
            "first_up" => Ok(Self::FirstUp),
            "fixed_budget" => Ok(Self::FixedBudget),
            other => Err(anyhow::anyhow!(
                "unknown goal '{other}' (expected first_hit, first_up or fixed_budget)"
            )),
        }
    }
}

/// Draw budget for `TrialGoal::FixedBudget`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimBudget {
    pub num_draws: u32,
}

/// One full trial configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Base probability away from pity.
    pub p_base: f64,
    pub pity: i32,
    #[serde(default)]
    pub ramp: Option<RampParams>,
    #[serde(default)]
    pub banner: Option<BannerParams>,
    /// Miss streak carried in from a previous pool.
    #[serde(default)]
    pub cushion: i64,
}

impl SimParams {
    pub fn new(p_base: f64, pity: i32) -> Self {
        Self {
            p_base,
            pity,
            ramp: None,
            banner: None,
            cushion: 0,
        }
    }

    pub fn with_ramp(mut self, ramp: RampParams) -> Self {
        self.ramp = Some(ramp);
        self
    }

    pub fn with_banner(mut self, off_probs: Vec<f64>, max_off: i32) -> Self {
        self.banner = Some(BannerParams { off_probs, max_off });
        self
    }

    pub fn with_cushion(mut self, cushion: i64) -> Self {
        self.cushion = cushion;
        self
    }

    pub fn engine_spec(&self) -> EngineSpec {
        EngineSpec {
            pity: self.pity,
            ramp: self.ramp.clone(),
            banner: self.banner.clone(),
        }
    }
}

/// Run `trials` trials on OS-entropy streams. Not reproducible.
/// `trials <= 0` returns empty Stats.
pub fn run_monte_carlo(
    params: &SimParams,
    goal: TrialGoal,
    trials: i64,
    budget: Option<SimBudget>,
) -> GachaResult<Stats> {
    run_trials(params, goal, trials, budget, |_| EntropySource::new())
}

/// Run `trials` trials on streams derived from `seed`. Reproducible.
pub fn run_monte_carlo_seeded(
    params: &SimParams,
    goal: TrialGoal,
    trials: i64,
    budget: Option<SimBudget>,
    seed: u64,
) -> GachaResult<Stats> {
    let bank = TrialRngBank::new(seed);
    run_trials(params, goal, trials, budget, |i| bank.for_trial(i))
}

fn run_trials<R, F>(
    params: &SimParams,
    goal: TrialGoal,
    trials: i64,
    budget: Option<SimBudget>,
    source_for: F,
) -> GachaResult<Stats>
where
    R: RandomSource,
    F: Fn(u64) -> R + Sync,
{
    if trials <= 0 {
        return Ok(Stats::default());
    }
    let spec = params.engine_spec();
    spec.validate()?;

    let samples = (0..trials as usize)
        .into_par_iter()
        .map(|i| simulate_one(&spec, params, goal, budget, source_for(i as u64)))
        .collect::<GachaResult<Vec<u32>>>()?;

    let stats = Stats::from_samples(samples);
    log::debug!(
        "monte carlo: goal={goal} trials={trials} mean={:.4} sd={:.4} p50={} p90={} p99={}",
        stats.mean,
        stats.std_dev,
        stats.p50,
        stats.p90,
        stats.p99
    );
    Ok(stats)
}

/// Primary metric of one trial.
fn simulate_one<R: RandomSource>(
    spec: &EngineSpec,
    params: &SimParams,
    goal: TrialGoal,
    budget: Option<SimBudget>,
    rng: R,
) -> GachaResult<u32> {
    let mut engine = spec.build(rng)?;
    engine.set_miss_streak(params.cushion);
    let p = params.p_base;

    match goal {
        TrialGoal::FirstHit | TrialGoal::FirstUp => {
            let want_up = goal == TrialGoal::FirstUp;
            for draws in 1..=TRIAL_DRAW_CAP {
                let out = engine.draw(p)?;
                if out.hit && (!want_up || out.is_up) {
                    return Ok(draws);
                }
            }
            log::warn!("trial reached the {TRIAL_DRAW_CAP}-draw cap without meeting goal {goal}");
            Ok(TRIAL_DRAW_CAP)
        }
        TrialGoal::FixedBudget => {
            let num_draws = budget.map_or(0, |b| b.num_draws);
            let mut count = 0;
            for _ in 0..num_draws {
                let out = engine.draw(p)?;
                if out.hit && out.is_up {
                    count += 1;
                }
            }
            Ok(count)
        }
    }
}
