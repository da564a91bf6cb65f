//! Banner layer: decides UP vs off-banner on every hit.
//!
//! RULES:
//!   - The wrapped soft-pity system decides whether a hit happens at all.
//!   - A miss never touches the off streak or the guarantee.
//!   - On a hit with the guarantee armed: UP, guarantee cleared, streak reset.
//!     No randomness is consumed for that decision.
//!   - Otherwise the off probability comes from `off_probs[off_streak]`,
//!     the last entry repeating once the streak outgrows the list.
//!   - An off hit increments the streak; once the streak EXCEEDS max_off the
//!     guarantee is armed for the next hit, not this one.

use crate::{
    draw::draw,
    error::GachaResult,
    rng::RandomSource,
    soft_pity::SoftPitySystem,
};
use serde::{Deserialize, Serialize};

/// Substitute for configured off probabilities outside (0, 1).
pub const DEFAULT_OFF_PROB: f64 = 0.5;

/// Post-state snapshot after one banner draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerOutcome {
    pub hit: bool,
    /// Only meaningful when `hit` is true.
    pub is_up: bool,
    /// Draws since the last hit, after this draw.
    pub miss_streak: u32,
    pub guaranteed_next: bool,
    pub off_streak: u32,
}

#[derive(Debug, Clone)]
pub struct BannerSystem<R> {
    soft_pity: SoftPitySystem<R>,
    off_probs: Vec<f64>,
    max_off: u32,
    off_streak: u32,
    guaranteed_next: bool,
}

impl<R: RandomSource> BannerSystem<R> {
    /// Wrap `soft_pity` with banner rules.
    ///
    /// An empty `off_probs` becomes `[0.5]`, and entries outside (0, 1) are
    /// replaced with 0.5. `max_off <= 0` defaults to `off_probs.len()`.
    pub fn new(soft_pity: SoftPitySystem<R>, off_probs: &[f64], max_off: i32) -> Self {
        let mut off_probs: Vec<f64> = off_probs
            .iter()
            .map(|&p| if p > 0.0 && p < 1.0 { p } else { DEFAULT_OFF_PROB })
            .collect();
        if off_probs.is_empty() {
            off_probs.push(DEFAULT_OFF_PROB);
        }
        let max_off = if max_off <= 0 {
            off_probs.len() as u32
        } else {
            max_off as u32
        };
        Self {
            soft_pity,
            off_probs,
            max_off,
            off_streak: 0,
            guaranteed_next: false,
        }
    }

    pub fn soft_pity(&self) -> &SoftPitySystem<R> {
        &self.soft_pity
    }

    pub fn off_probs(&self) -> &[f64] {
        &self.off_probs
    }

    pub fn max_off(&self) -> u32 {
        self.max_off
    }

    pub fn off_streak(&self) -> u32 {
        self.off_streak
    }

    pub fn guaranteed_next(&self) -> bool {
        self.guaranteed_next
    }

    pub fn miss_streak(&self) -> u32 {
        self.soft_pity.miss_streak()
    }

    /// Seed the underlying miss streak (cushion).
    pub fn set_miss_streak(&mut self, streak: i64) {
        self.soft_pity.set_miss_streak(streak);
    }

    /// Change the off threshold mid-sequence. The streak is kept as-is.
    pub fn set_max_off(&mut self, max_off: u32) {
        self.max_off = max_off;
    }

    /// Off probability at the current streak, kept strictly inside (0, 1).
    pub fn current_off_prob(&self) -> f64 {
        let idx = (self.off_streak as usize).min(self.off_probs.len() - 1);
        let p = self.off_probs[idx];
        if p <= 0.0 {
            f64::MIN_POSITIVE
        } else if p >= 1.0 {
            1.0 - 1e-12
        } else {
            p
        }
    }

    /// One banner draw with base probability `p_base`.
    pub fn draw(&mut self, p_base: f64) -> GachaResult<BannerOutcome> {
        let hit = self.soft_pity.draw(p_base)?;
        if !hit {
            return Ok(self.outcome(false, false));
        }

        if self.guaranteed_next {
            self.guaranteed_next = false;
            self.off_streak = 0;
            return Ok(self.outcome(true, true));
        }

        let off_prob = self.current_off_prob();
        let off = draw(off_prob, self.soft_pity.rng_mut())?;
        if off {
            self.off_streak += 1;
            if self.off_streak > self.max_off {
                self.guaranteed_next = true;
            }
            return Ok(self.outcome(true, false));
        }

        self.off_streak = 0;
        self.guaranteed_next = false;
        Ok(self.outcome(true, true))
    }

    /// `n` consecutive banner draws; aborts on the first error.
    pub fn draw_n(&mut self, p_base: f64, n: usize) -> GachaResult<Vec<BannerOutcome>> {
        (0..n).map(|_| self.draw(p_base)).collect()
    }

    fn outcome(&self, hit: bool, is_up: bool) -> BannerOutcome {
        BannerOutcome {
            hit,
            is_up,
            miss_streak: self.soft_pity.miss_streak(),
            guaranteed_next: self.guaranteed_next,
            off_streak: self.off_streak,
        }
    }
}
