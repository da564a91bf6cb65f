//! Summary statistics over per-trial integer samples.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub trials: usize,
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    pub std_dev: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    /// Raw per-trial samples in trial order. Not exported.
    #[serde(skip)]
    pub samples: Vec<u32>,
}

impl Stats {
    /// Aggregate a sample set. Empty input gives `Stats::default()`.
    pub fn from_samples(samples: Vec<u32>) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self::default();
        }

        let mean = samples.iter().map(|&v| f64::from(v)).sum::<f64>() / n as f64;
        let variance = samples
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;

        let mut sorted = samples.clone();
        sorted.sort_unstable();

        Self {
            trials: n,
            mean,
            variance,
            std_dev: variance.sqrt(),
            p50: percentile(&sorted, 0.50),
            p90: percentile(&sorted, 0.90),
            p99: percentile(&sorted, 0.99),
            samples,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trials == 0
    }

    /// Reciprocal of the mean: the per-draw hit rate when samples are draw
    /// counts. 0 when the mean is 0.
    pub fn hit_rate(&self) -> f64 {
        if self.mean > 0.0 {
            1.0 / self.mean
        } else {
            0.0
        }
    }
}

/// Linear interpolation between order statistics at position `q * (n - 1)`.
/// `sorted` must be ascending and non-empty.
fn percentile(sorted: &[u32], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 || q <= 0.0 {
        return f64::from(sorted[0]);
    }
    if q >= 1.0 {
        return f64::from(sorted[n - 1]);
    }
    let pos = q * (n - 1) as f64;
    let i = pos.floor() as usize;
    let frac = pos - i as f64;
    if i + 1 >= n {
        return f64::from(sorted[i]);
    }
    f64::from(sorted[i]) * (1.0 - frac) + f64::from(sorted[i + 1]) * frac
}
