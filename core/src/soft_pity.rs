//! Soft pity: a probability ramp ahead of the hard-pity threshold.
//!
//! Example: pity = 90, ramp_start = 74, target = 0.5.
//! Draws at miss streak 74..=89 ramp p from the base value up to 0.5,
//! and the draw at streak 89 (the 90th) is forced by hard pity anyway.
//!
//! The ramp never produces p = 1.0; that job belongs to hard pity alone.

use crate::{
    draw::draw,
    error::{GachaError, GachaResult},
    pity::PitySystem,
    rng::RandomSource,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Highest probability the ramp may produce.
pub const MAX_RAMP_PROB: f64 = 0.999_999_999_999;

/// Curve applied to ramp progress t in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "easeOutQuad")]
    EaseOutQuad,
    #[serde(rename = "easeInOutCubic")]
    EaseInOutCubic,
}

impl Easing {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseOutQuad => "easeOutQuad",
            Self::EaseInOutCubic => "easeInOutCubic",
        }
    }

    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Easing {
    type Err = anyhow::Error;

    /// An empty name means linear.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "linear" => Ok(Self::Linear),
            "easeOutQuad" => Ok(Self::EaseOutQuad),
            "easeInOutCubic" => Ok(Self::EaseInOutCubic),
            other => Err(anyhow::anyhow!(
                "unknown easing '{other}' (expected linear, easeOutQuad or easeInOutCubic)"
            )),
        }
    }
}

/// Ramp shape ahead of hard pity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftPityConfig {
    /// Hard-pity threshold. Overwritten with the owning system's threshold.
    pub pity: i32,
    /// Miss streak at which the ramp begins.
    pub ramp_start: i32,
    /// Probability reached at miss streak `pity - 1`.
    pub target_prob: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl SoftPityConfig {
    pub fn new(pity: i32, ramp_start: i32, target_prob: f64, easing: Easing) -> GachaResult<Self> {
        Self {
            pity,
            ramp_start,
            target_prob,
            easing,
        }
        .normalized()
    }

    /// Validate, clamping a negative ramp start to 0.
    /// A ramp that leaves no room before the hard cap is an error, never
    /// silently degraded.
    pub fn normalized(mut self) -> GachaResult<Self> {
        if self.pity <= 1 {
            return Err(GachaError::InvalidPityConfig {
                reason: "pity must be greater than 1 for a soft ramp",
            });
        }
        if !self.target_prob.is_finite() || self.target_prob <= 0.0 || self.target_prob >= 1.0 {
            return Err(GachaError::InvalidPityConfig {
                reason: "target probability must be within (0, 1)",
            });
        }
        self.ramp_start = self.ramp_start.max(0);
        if self.ramp_start >= self.pity - 1 {
            return Err(GachaError::InvalidPityConfig {
                reason: "ramp start leaves no room before hard pity",
            });
        }
        Ok(self)
    }

    /// Last miss streak of the ramp.
    pub fn ramp_end(&self) -> i32 {
        self.pity - 1
    }
}

#[derive(Debug, Clone)]
pub struct SoftPitySystem<R> {
    base: PitySystem<R>,
    soft: Option<SoftPityConfig>,
}

impl<R: RandomSource> SoftPitySystem<R> {
    /// Build a pity system with an optional ramp. Without a ramp this behaves
    /// exactly like `PitySystem`.
    pub fn new(pity: i32, soft: Option<SoftPityConfig>, rng: R) -> GachaResult<Self> {
        let soft = soft
            .map(|cfg| SoftPityConfig { pity, ..cfg }.normalized())
            .transpose()?;
        Ok(Self {
            base: PitySystem::new(pity, rng),
            soft,
        })
    }

    pub fn pity(&self) -> i32 {
        self.base.pity()
    }

    pub fn miss_streak(&self) -> u32 {
        self.base.miss_streak()
    }

    pub fn soft_config(&self) -> Option<&SoftPityConfig> {
        self.soft.as_ref()
    }

    /// See `PitySystem::set_miss_streak`.
    pub fn set_miss_streak(&mut self, streak: i64) {
        self.base.set_miss_streak(streak);
    }

    /// Probability the next draw will use at the current miss streak.
    pub fn effective_probability(&self, p_base: f64) -> f64 {
        if self.base.at_hard_cap() {
            return 1.0;
        }
        let Some(cfg) = &self.soft else {
            return p_base;
        };
        let streak = self.base.miss_streak() as i64;
        let start = i64::from(cfg.ramp_start);
        if streak < start {
            return p_base;
        }

        let length = i64::from(cfg.ramp_end()) - start;
        if length <= 0 {
            return p_base;
        }
        let t = ((streak - start) as f64 / length as f64).clamp(0.0, 1.0);
        let eased = cfg.easing.apply(t);
        let p = p_base + (cfg.target_prob - p_base) * eased;
        p.clamp(0.0, MAX_RAMP_PROB)
    }

    /// One draw with base probability `p_base`, ramp and hard pity applied.
    pub fn draw(&mut self, p_base: f64) -> GachaResult<bool> {
        if self.base.take_forced_hit() {
            return Ok(true);
        }
        let p_eff = self.effective_probability(p_base);
        let hit = draw(p_eff, self.base.rng_mut())?;
        self.base.record(hit);
        Ok(hit)
    }

    /// `n` consecutive draws; aborts on the first error.
    pub fn draw_n(&mut self, p_base: f64, n: usize) -> GachaResult<Vec<bool>> {
        (0..n).map(|_| self.draw(p_base)).collect()
    }

    pub(crate) fn rng_mut(&mut self) -> &mut R {
        self.base.rng_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededSource;

    fn system(easing: Easing) -> SoftPitySystem<SeededSource> {
        let cfg = SoftPityConfig::new(90, 74, 0.5, easing).expect("valid config");
        SoftPitySystem::new(90, Some(cfg), SeededSource::new(1)).expect("valid system")
    }

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in [Easing::Linear, Easing::EaseOutQuad, Easing::EaseInOutCubic] {
            assert_eq!(easing.apply(0.0), 0.0, "{easing} at t=0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing} at t=1");
        }
        assert!((Easing::EaseInOutCubic.apply(0.5) - 0.5).abs() < 1e-12);
        assert!((Easing::EaseOutQuad.apply(0.5) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn linear_ramp_interpolates_between_base_and_target() {
        let mut sp = system(Easing::Linear);
        sp.set_miss_streak(88);
        assert!((sp.effective_probability(0.006) - (0.006 + (0.5 - 0.006) * 14.0 / 15.0)).abs() < 1e-12);
    }

    #[test]
    fn hard_cap_short_circuits_the_ramp() {
        let mut sp = system(Easing::EaseOutQuad);
        sp.set_miss_streak(89);
        assert_eq!(sp.effective_probability(0.006), 1.0);
    }

    #[test]
    fn ramp_never_yields_certainty_before_hard_pity() {
        let mut sp = system(Easing::Linear);
        sp.set_miss_streak(74);
        assert_eq!(sp.effective_probability(1.0), MAX_RAMP_PROB);
        sp.set_miss_streak(10);
        assert_eq!(sp.effective_probability(1.0), 1.0, "below the ramp p passes through");
    }

    #[test]
    fn easing_names_round_trip() {
        for easing in [Easing::Linear, Easing::EaseOutQuad, Easing::EaseInOutCubic] {
            assert_eq!(easing.name().parse::<Easing>().expect("known name"), easing);
        }
        assert_eq!("".parse::<Easing>().expect("empty is linear"), Easing::Linear);
        assert!("bounce".parse::<Easing>().is_err());
    }
}
