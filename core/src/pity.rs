//! Hard pity: a hit is forced once the miss streak reaches the threshold.

use crate::{draw::draw, error::GachaResult, rng::RandomSource};

#[derive(Debug, Clone)]
pub struct PitySystem<R> {
    /// Threshold draw count. `<= 0` disables pity entirely.
    pity: i32,
    /// Draws since the last hit.
    miss_streak: u32,
    rng: R,
}

impl<R: RandomSource> PitySystem<R> {
    pub fn new(pity: i32, rng: R) -> Self {
        Self {
            pity,
            miss_streak: 0,
            rng,
        }
    }

    pub fn pity(&self) -> i32 {
        self.pity
    }

    pub fn miss_streak(&self) -> u32 {
        self.miss_streak
    }

    pub fn is_enabled(&self) -> bool {
        self.pity > 0
    }

    /// Seed the miss streak, e.g. with draws carried over from another pool.
    /// Clamped into [0, pity - 1]; always 0 when pity is disabled.
    pub fn set_miss_streak(&mut self, streak: i64) {
        let ceiling = i64::from(self.pity.max(1)) - 1;
        self.miss_streak = streak.clamp(0, ceiling) as u32;
    }

    /// One draw at probability `p`.
    ///
    /// The draw that would bring the streak to the threshold is a forced hit
    /// and consumes no randomness. With pity disabled this is a plain draw
    /// and the streak is left alone.
    pub fn draw(&mut self, p: f64) -> GachaResult<bool> {
        if !self.is_enabled() {
            return draw(p, &mut self.rng);
        }
        if self.take_forced_hit() {
            return Ok(true);
        }
        let hit = draw(p, &mut self.rng)?;
        self.record(hit);
        Ok(hit)
    }

    /// True when the next draw reaches the threshold.
    pub(crate) fn at_hard_cap(&self) -> bool {
        self.is_enabled() && i64::from(self.miss_streak) + 1 >= i64::from(self.pity)
    }

    /// Consume the forced hit if the threshold is reached. Resets the streak.
    pub(crate) fn take_forced_hit(&mut self) -> bool {
        if self.at_hard_cap() {
            self.miss_streak = 0;
            return true;
        }
        false
    }

    pub(crate) fn record(&mut self, hit: bool) {
        if !self.is_enabled() {
            return;
        }
        if hit {
            self.miss_streak = 0;
        } else {
            self.miss_streak += 1;
        }
    }

    pub(crate) fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}
