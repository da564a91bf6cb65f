//! Single Bernoulli draw: the numeric edge-case authority for every layer above.
//!
//! p <= 0 never hits and p >= 1 always hits, and neither extreme consumes
//! randomness. Seeded test sequences depend on that.

use crate::{
    error::{GachaError, GachaResult},
    rng::RandomSource,
};

/// Reject NaN, infinities and anything outside [0, 1].
pub fn validate_probability(p: f64) -> GachaResult<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(GachaError::InvalidProbability { p });
    }
    Ok(())
}

/// One draw at probability `p`. Consumes at most one value from `rng`.
pub fn draw<R: RandomSource + ?Sized>(p: f64, rng: &mut R) -> GachaResult<bool> {
    validate_probability(p)?;
    if p <= 0.0 {
        return Ok(false);
    }
    if p >= 1.0 {
        return Ok(true);
    }
    Ok(rng.next_f64() < p)
}

/// `n` independent draws at probability `p`, no pity.
pub fn draw_n<R: RandomSource + ?Sized>(p: f64, n: usize, rng: &mut R) -> GachaResult<Vec<bool>> {
    (0..n).map(|_| draw(p, rng)).collect()
}
