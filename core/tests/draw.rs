//! Bernoulli draw edge cases.
//!
//! The extremes must never touch the random source: seeded sequences in
//! every layer above rely on it.

use gacha_core::{
    draw::{draw, draw_n},
    GachaError, RandomSource, SeededSource,
};

/// Fails the test if any randomness is requested.
#[derive(Debug)]
struct PanickingSource;

impl RandomSource for PanickingSource {
    fn next_f64(&mut self) -> f64 {
        panic!("randomness consumed at a probability extreme");
    }
}

/// Counts how many values were requested.
#[derive(Debug)]
struct CountingSource {
    inner: SeededSource,
    calls: usize,
}

impl RandomSource for CountingSource {
    fn next_f64(&mut self) -> f64 {
        self.calls += 1;
        self.inner.next_f64()
    }
}

#[test]
fn non_positive_probability_never_hits_and_consumes_nothing() {
    for p in [0.0, -0.0] {
        for _ in 0..100 {
            assert!(!draw(p, &mut PanickingSource).unwrap());
        }
    }
}

#[test]
fn probability_one_always_hits_and_consumes_nothing() {
    for _ in 0..100 {
        assert!(draw(1.0, &mut PanickingSource).unwrap());
    }
}

#[test]
fn interior_probability_consumes_exactly_one_value() {
    let mut src = CountingSource {
        inner: SeededSource::new(9),
        calls: 0,
    };
    for i in 1..=50 {
        draw(0.5, &mut src).unwrap();
        assert_eq!(src.calls, i);
    }
}

#[test]
fn invalid_probabilities_are_rejected() {
    for p in [-0.1, 1.1, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = draw(p, &mut PanickingSource).unwrap_err();
        assert!(
            matches!(err, GachaError::InvalidProbability { .. }),
            "p={p} should be InvalidProbability, got {err:?}"
        );
    }
}

#[test]
fn hit_frequency_matches_probability() {
    const P: f64 = 0.3;
    const N: usize = 100_000;
    let mut rng = SeededSource::new(42);
    let hits = draw_n(P, N, &mut rng).unwrap().into_iter().filter(|&h| h).count();
    let freq = hits as f64 / N as f64;
    assert!((freq - P).abs() <= 0.01, "freq={freq} not close to p={P}");
}

#[test]
fn draw_n_stops_at_first_error() {
    assert!(draw_n(2.0, 10, &mut PanickingSource).is_err());
    assert!(draw_n(0.5, 0, &mut PanickingSource).unwrap().is_empty());
}
