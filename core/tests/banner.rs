//! Banner layer: off/UP decisions, streak indexing, and the guarantee.

use gacha_core::{BannerSystem, GachaError, RandomSource, SeededSource, SoftPitySystem};

/// Every request returns the same value and is counted.
#[derive(Debug)]
struct ConstSource {
    value: f64,
    calls: usize,
}

impl ConstSource {
    /// 0.0 < any off probability, so every off decision comes out "off".
    fn always_off() -> Self {
        Self { value: 0.0, calls: 0 }
    }

    /// Above every configured off probability, so every decision is UP.
    fn always_up() -> Self {
        Self {
            value: 0.999_999,
            calls: 0,
        }
    }
}

impl RandomSource for ConstSource {
    fn next_f64(&mut self) -> f64 {
        self.calls += 1;
        self.value
    }
}

/// Replays a fixed list of values, then panics.
#[derive(Debug)]
struct ScriptedSource(Vec<f64>);

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        assert!(!self.0.is_empty(), "script exhausted");
        self.0.remove(0)
    }
}

fn banner<R: RandomSource>(rng: R, pity: i32, off_probs: &[f64], max_off: i32) -> BannerSystem<R> {
    let sp = SoftPitySystem::new(pity, None, rng).expect("no ramp");
    BannerSystem::new(sp, off_probs, max_off)
}

#[test]
fn guarantee_overrides_rigged_off_decisions() {
    const MAX_OFF: u32 = 2;
    // p = 1 hits without randomness; only the off decisions consume values.
    let mut b = banner(ConstSource::always_off(), 90, &[1.0, 1.0], MAX_OFF as i32);

    for i in 1..=MAX_OFF + 1 {
        let out = b.draw(1.0).unwrap();
        assert!(out.hit);
        assert!(!out.is_up, "hit {i} should be off-banner");
        assert_eq!(out.off_streak, i);
        assert_eq!(out.guaranteed_next, i > MAX_OFF, "hit {i}");
    }

    let out = b.draw(1.0).unwrap();
    assert!(out.hit && out.is_up, "hit {} must be UP by guarantee", MAX_OFF + 2);
    assert!(!out.guaranteed_next, "guarantee is consumed exactly once");
    assert_eq!(out.off_streak, 0);

    let out = b.draw(1.0).unwrap();
    assert!(!out.is_up, "after the guarantee the rigged source decides again");
    assert_eq!(out.off_streak, 1);
}

#[test]
fn streak_equal_to_max_off_does_not_guarantee() {
    let mut b = banner(ConstSource::always_off(), 90, &[0.5], 3);
    for _ in 0..3 {
        b.draw(1.0).unwrap();
    }
    assert_eq!(b.off_streak(), 3);
    assert!(!b.guaranteed_next(), "guarantee needs off_streak > max_off");
    b.draw(1.0).unwrap();
    assert!(b.guaranteed_next());
}

#[test]
fn lowering_max_off_mid_sequence_arms_on_next_off() {
    let mut b = banner(ConstSource::always_off(), 90, &[0.5], 5);
    for _ in 0..3 {
        b.draw(1.0).unwrap();
    }
    b.set_max_off(1);
    assert!(!b.guaranteed_next(), "changing the threshold alone arms nothing");
    let out = b.draw(1.0).unwrap();
    assert_eq!(out.off_streak, 4);
    assert!(out.guaranteed_next);
}

#[test]
fn guaranteed_up_consumes_no_randomness() {
    let mut src = ConstSource::always_off();
    {
        let mut b = banner(&mut src, 90, &[0.5], 1);
        b.draw(1.0).unwrap();
        b.draw(1.0).unwrap();
        assert!(b.guaranteed_next());
        let out = b.draw(1.0).unwrap();
        assert!(out.is_up);
    }
    assert_eq!(src.calls, 2, "only the two off decisions draw randomness");
}

#[test]
fn misses_leave_banner_state_untouched() {
    let mut b = banner(ConstSource::always_off(), 90, &[0.5], 1);
    b.draw(1.0).unwrap();
    b.draw(1.0).unwrap();
    assert!(b.guaranteed_next());

    for i in 1..=10 {
        let out = b.draw(0.0).unwrap();
        assert!(!out.hit);
        assert!(!out.is_up);
        assert_eq!(out.miss_streak, i);
        assert_eq!(out.off_streak, 2);
        assert!(out.guaranteed_next);
    }
}

#[test]
fn up_decision_resets_the_off_streak() {
    // Hits by p = 1; decisions: off, off, up.
    let mut b = banner(ScriptedSource(vec![0.1, 0.1, 0.9]), 90, &[0.5], 5);
    assert!(!b.draw(1.0).unwrap().is_up);
    assert!(!b.draw(1.0).unwrap().is_up);
    let out = b.draw(1.0).unwrap();
    assert!(out.is_up);
    assert_eq!(out.off_streak, 0);
    assert!(!out.guaranteed_next);
}

#[test]
fn off_probability_follows_the_streak_and_repeats_the_last() {
    let b = banner(ConstSource::always_off(), 90, &[0.5, 0.4, 0.3], 10);
    assert_eq!(b.current_off_prob(), 0.5);

    let mut b = b;
    let expected = [0.4, 0.3, 0.3, 0.3];
    for want in expected {
        b.draw(1.0).unwrap();
        assert_eq!(b.current_off_prob(), want, "at off_streak {}", b.off_streak());
    }
}

#[test]
fn streak_dependent_probability_decides_off() {
    // Streak 0 uses 0.5, streak 1 uses 0.2. A value of 0.3 is off at the
    // first decision and UP at the second.
    let mut b = banner(ScriptedSource(vec![0.3, 0.3]), 90, &[0.5, 0.2], 5);
    assert!(!b.draw(1.0).unwrap().is_up);
    assert!(b.draw(1.0).unwrap().is_up);
}

#[test]
fn construction_sanitizes_inputs() {
    let b = banner(ConstSource::always_up(), 90, &[], 0);
    assert_eq!(b.off_probs(), &[0.5]);
    assert_eq!(b.max_off(), 1, "max_off <= 0 defaults to the list length");

    let b = banner(
        ConstSource::always_up(),
        90,
        &[0.0, 1.0, -3.0, f64::NAN, 0.25],
        -1,
    );
    assert_eq!(b.off_probs(), &[0.5, 0.5, 0.5, 0.5, 0.25]);
    assert_eq!(b.max_off(), 5);
}

#[test]
fn hard_pity_still_governs_hits() {
    let mut b = banner(ConstSource::always_up(), 10, &[0.5], 1);
    let outs = b.draw_n(0.0, 10).unwrap();
    assert!(outs[..9].iter().all(|o| !o.hit));
    assert!(outs[9].hit && outs[9].is_up);
    assert_eq!(outs[9].miss_streak, 0);
}

#[test]
fn invalid_probability_propagates_through_the_banner() {
    let mut b = banner(SeededSource::new(1), 90, &[0.5], 1);
    let err = b.draw(-0.5).unwrap_err();
    assert_eq!(err, GachaError::InvalidProbability { p: -0.5 });
    assert!(b.draw_n(f64::NAN, 3).is_err());
}

#[test]
fn long_run_up_share_matches_fifty_fifty_with_guarantee() {
    // With 50/50 and a guarantee after two losses, UP share of hits is
    // 1 / E[hits per UP] = 1 / (1 + 0.5 + 0.25) = 4/7.
    let mut b = banner(SeededSource::new(2024), 90, &[0.5], 1);
    let outs = b.draw_n(1.0, 200_000).unwrap();
    let ups = outs.iter().filter(|o| o.is_up).count() as f64;
    let share = ups / outs.len() as f64;
    assert!((share - 4.0 / 7.0).abs() < 0.01, "UP share {share}");
}
