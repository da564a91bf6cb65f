//! Engine assembly: flat, already-validated numbers in, a ready engine out.
//!
//! A GachaEngine is either a soft/hard pity system on its own, or the same
//! system wrapped in banner rules. Both are driven through one `draw` that
//! returns a full post-state snapshot, so callers never branch on the layer.
//!
//! RULES:
//!   - An engine is advanced by one caller at a time (`&mut self`).
//!   - Construction is the only place config errors surface.
//!   - Without a banner, every hit counts as UP.

use crate::{
    banner::{BannerOutcome, BannerSystem},
    error::GachaResult,
    rng::RandomSource,
    soft_pity::{Easing, SoftPityConfig, SoftPitySystem},
};
use serde::{Deserialize, Serialize};

/// Soft ramp parameters as supplied by a caller.
///
/// The ramp start is given either as a miss-streak index or as a fraction of
/// pity; the index wins when both are present. Without either, no ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampParams {
    #[serde(default)]
    pub start_at: Option<i32>,
    #[serde(default)]
    pub start_pct: Option<f64>,
    pub target_prob: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl RampParams {
    /// Resolve the ramp start for a given pity, or None when no start is set.
    ///
    /// A fraction is clamped to [0, 1] and rounded up; a start at or past
    /// the last pre-pity draw is pulled back to `pity - 1`, which the config
    /// then rejects as leaving no room.
    pub fn resolve_start(&self, pity: i32) -> Option<i32> {
        if let Some(start) = self.start_at {
            return Some(start);
        }
        let pct = self.start_pct?.clamp(0.0, 1.0);
        let start = (pct * f64::from(pity)).ceil() as i32;
        Some(if start >= pity { pity - 1 } else { start })
    }

    /// Unvalidated config; `SoftPitySystem::new` validates it.
    pub fn soft_config(&self, pity: i32) -> Option<SoftPityConfig> {
        self.resolve_start(pity).map(|ramp_start| SoftPityConfig {
            pity,
            ramp_start,
            target_prob: self.target_prob,
            easing: self.easing,
        })
    }
}

/// Banner parameters. An empty `off_probs` disables the banner layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerParams {
    pub off_probs: Vec<f64>,
    /// `<= 0` means `off_probs.len()`.
    #[serde(default)]
    pub max_off: i32,
}

/// Everything needed to build one engine, minus the random source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSpec {
    pub pity: i32,
    #[serde(default)]
    pub ramp: Option<RampParams>,
    #[serde(default)]
    pub banner: Option<BannerParams>,
}

impl EngineSpec {
    /// Hard pity only.
    pub fn hard_pity(pity: i32) -> Self {
        Self {
            pity,
            ramp: None,
            banner: None,
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

    pub fn has_banner(&self) -> bool {
        self.banner.as_ref().is_some_and(|b| !b.off_probs.is_empty())
    }

    pub fn soft_config(&self) -> Option<SoftPityConfig> {
        self.ramp.as_ref().and_then(|r| r.soft_config(self.pity))
    }

    /// Reject a bad ramp without building an engine.
    pub fn validate(&self) -> GachaResult<()> {
        if let Some(cfg) = self.soft_config() {
            cfg.normalized()?;
        }
        Ok(())
    }

    pub fn build<R: RandomSource>(&self, rng: R) -> GachaResult<GachaEngine<R>> {
        let soft = SoftPitySystem::new(self.pity, self.soft_config(), rng)?;
        Ok(match &self.banner {
            Some(b) if !b.off_probs.is_empty() => {
                GachaEngine::Banner(BannerSystem::new(soft, &b.off_probs, b.max_off))
            }
            _ => GachaEngine::Pity(soft),
        })
    }
}

#[derive(Debug, Clone)]
pub enum GachaEngine<R> {
    Pity(SoftPitySystem<R>),
    Banner(BannerSystem<R>),
}

impl<R: RandomSource> GachaEngine<R> {
    pub fn draw(&mut self, p_base: f64) -> GachaResult<BannerOutcome> {
        match self {
            Self::Pity(sp) => {
                let hit = sp.draw(p_base)?;
                Ok(BannerOutcome {
                    hit,
                    is_up: hit,
                    miss_streak: sp.miss_streak(),
                    guaranteed_next: false,
                    off_streak: 0,
                })
            }
            Self::Banner(banner) => banner.draw(p_base),
        }
    }

    pub fn draw_n(&mut self, p_base: f64, n: usize) -> GachaResult<Vec<BannerOutcome>> {
        (0..n).map(|_| self.draw(p_base)).collect()
    }

    pub fn has_banner(&self) -> bool {
        matches!(self, Self::Banner(_))
    }

    pub fn set_miss_streak(&mut self, streak: i64) {
        match self {
            Self::Pity(sp) => sp.set_miss_streak(streak),
            Self::Banner(banner) => banner.set_miss_streak(streak),
        }
    }

    pub fn miss_streak(&self) -> u32 {
        match self {
            Self::Pity(sp) => sp.miss_streak(),
            Self::Banner(banner) => banner.miss_streak(),
        }
    }

    pub fn off_streak(&self) -> u32 {
        match self {
            Self::Pity(_) => 0,
            Self::Banner(banner) => banner.off_streak(),
        }
    }

    pub fn guaranteed_next(&self) -> bool {
        match self {
            Self::Pity(_) => false,
            Self::Banner(banner) => banner.guaranteed_next(),
        }
    }
}
