//! Uniform random sources for the draw engine.
//!
//! RULE: Engines never reach for a platform RNG directly.
//! Every random value flows through a RandomSource owned by the engine.
//!
//! Two implementations:
//!   - EntropySource: OS-entropy backed, non-reproducible. The default.
//!   - SeededSource:  PCG stream from a u64 seed. Reproducible.
//!
//! For Monte Carlo runs, TrialRngBank derives one independent stream
//! per trial from a single master seed, so results never depend on
//! which worker thread executed which trial.

use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A stateful generator of uniform doubles in [0.0, 1.0).
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Map 53 random bits onto [0.0, 1.0).
fn unit_f64(bits: u64) -> f64 {
    (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// OS-entropy backed source. Not reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropySource;

impl EntropySource {
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for EntropySource {
    fn next_f64(&mut self) -> f64 {
        let mut buf = [0u8; 8];
        if let Err(e) = OsRng.try_fill_bytes(&mut buf) {
            // Entropy pool unavailable: fall back to the thread-local generator.
            log::warn!("OS entropy read failed ({e}); using thread rng");
            return unit_f64(rand::thread_rng().next_u64());
        }
        unit_f64(u64::from_be_bytes(buf))
    }
}

/// Deterministic PCG-backed source. Same seed, same sequence.
#[derive(Debug, Clone)]
pub struct SeededSource {
    inner: Pcg64Mcg,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_f64(&mut self) -> f64 {
        unit_f64(self.inner.next_u64())
    }
}

/// Per-trial stream derivation for a single simulation run.
#[derive(Debug, Clone, Copy)]
pub struct TrialRngBank {
    master_seed: u64,
}

impl TrialRngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Stream for one trial. The index is the trial's position in the run.
    pub fn for_trial(&self, trial_index: u64) -> SeededSource {
        let derived = self.master_seed ^ trial_index.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        SeededSource::new(derived)
    }
}
