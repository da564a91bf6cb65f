//! sim-runner: headless Monte Carlo runner for the gacha draw engine.
//!
//! Usage:
//!   sim-runner --goal first_up --trials 200000 --p 0.006 --pity 90 \
//!              --start 73 --target 0.5 --off-probs 0.5 --max-off 1 --seed 42
//!   sim-runner --config run.json --threads 4 --json

use anyhow::{bail, Result};
use gacha_core::{
    config::RunConfig,
    engine::{BannerParams, RampParams},
    run_monte_carlo, run_monte_carlo_seeded, Easing, SimBudget, SimParams, Stats, TrialGoal,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let cfg = build_config(&args)?;
    let json = args.iter().any(|a| a == "--json");

    if let Some(threads) = flag_value(&args, "--threads") {
        let threads: usize = threads.parse()?;
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    if !json {
        println!("Gacha Monte Carlo: sim-runner");
        println!("  goal:      {}", cfg.goal);
        println!("  trials:    {}", cfg.trials);
        println!("  p_base:    {}", cfg.params.p_base);
        println!("  pity:      {}", cfg.params.pity);
        println!("  cushion:   {}", cfg.params.cushion);
        match cfg.seed {
            Some(seed) => println!("  seed:      {seed}"),
            None => println!("  seed:      (entropy)"),
        }
        println!();
    }

    let stats = match cfg.seed {
        Some(seed) => run_monte_carlo_seeded(&cfg.params, cfg.goal, cfg.trials, cfg.budget, seed)?,
        None => run_monte_carlo(&cfg.params, cfg.goal, cfg.trials, cfg.budget)?,
    };

    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        print_summary(&cfg, &stats);
    }
    Ok(())
}

/// File config first (if any), then command-line flags on top.
fn build_config(args: &[String]) -> Result<RunConfig> {
    let mut cfg = match flag_value(args, "--config") {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig {
            params: SimParams::new(0.006, 90),
            goal: TrialGoal::FirstUp,
            trials: 100_000,
            budget: None,
            seed: None,
        },
    };

    if let Some(goal) = flag_value(args, "--goal") {
        cfg.goal = goal.parse()?;
    }
    cfg.trials = parse_arg(args, "--trials", cfg.trials);
    cfg.params.p_base = parse_arg(args, "--p", cfg.params.p_base);
    cfg.params.pity = parse_arg(args, "--pity", cfg.params.pity);
    cfg.params.cushion = parse_arg(args, "--cushion", cfg.params.cushion);
    if let Some(seed) = flag_value(args, "--seed") {
        cfg.seed = Some(seed.parse()?);
    }
    if let Some(n) = flag_value(args, "--budget") {
        cfg.budget = Some(SimBudget { num_draws: n.parse()? });
    }

    apply_ramp_flags(args, &mut cfg.params)?;
    apply_banner_flags(args, &mut cfg.params)?;

    if cfg.goal == TrialGoal::FixedBudget && cfg.budget.map_or(true, |b| b.num_draws == 0) {
        bail!("--budget N (N > 0) is required for goal fixed_budget");
    }
    Ok(cfg)
}

fn apply_ramp_flags(args: &[String], params: &mut SimParams) -> Result<()> {
    let start_at = flag_value(args, "--start").map(str::parse::<i32>).transpose()?;
    let start_pct = flag_value(args, "--start-pct").map(str::parse::<f64>).transpose()?;
    let target = flag_value(args, "--target").map(str::parse::<f64>).transpose()?;
    let easing = flag_value(args, "--easing").map(str::parse::<Easing>).transpose()?;

    if start_at.is_none() && start_pct.is_none() && target.is_none() && easing.is_none() {
        return Ok(());
    }

    let mut ramp = params.ramp.clone().unwrap_or(RampParams {
        start_at: None,
        start_pct: None,
        target_prob: 0.0,
        easing: Easing::Linear,
    });
    if start_at.is_some() || start_pct.is_some() {
        ramp.start_at = start_at;
        ramp.start_pct = start_pct;
    }
    if let Some(target) = target {
        ramp.target_prob = target;
    }
    if let Some(easing) = easing {
        ramp.easing = easing;
    }
    if target.is_none() && params.ramp.is_none() {
        bail!("--target is required to configure a soft-pity ramp");
    }
    params.ramp = Some(ramp);
    Ok(())
}

fn apply_banner_flags(args: &[String], params: &mut SimParams) -> Result<()> {
    if let Some(raw) = flag_value(args, "--off-probs") {
        let off_probs = parse_off_probs(raw)?;
        let max_off = params.banner.as_ref().map_or(0, |b| b.max_off);
        params.banner = Some(BannerParams { off_probs, max_off });
    }
    if let Some(raw) = flag_value(args, "--max-off") {
        let max_off: i32 = raw.parse()?;
        match params.banner.as_mut() {
            Some(banner) => banner.max_off = max_off,
            None => log::warn!("--max-off ignored: no banner configured (use --off-probs)"),
        }
    }
    Ok(())
}

/// "0.5, 0.4,0.3" -> [0.5, 0.4, 0.3]. Blank entries are skipped.
fn parse_off_probs(raw: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<f64>() {
            Ok(v) => out.push(v),
            Err(_) => bail!("invalid off_probs element: {part}"),
        }
    }
    if out.is_empty() {
        bail!("off_probs empty after parsing");
    }
    Ok(out)
}

fn print_summary(cfg: &RunConfig, stats: &Stats) {
    println!("=== RUN SUMMARY ===");
    if stats.is_empty() {
        println!("  (no trials run)");
        return;
    }
    println!("  trials:    {}", stats.trials);
    println!("  mean:      {:.4}", stats.mean);
    println!("  variance:  {:.4}", stats.variance);
    println!("  std dev:   {:.4}", stats.std_dev);
    println!("  p50:       {:.2}", stats.p50);
    println!("  p90:       {:.2}", stats.p90);
    println!("  p99:       {:.2}", stats.p99);
    if cfg.goal != TrialGoal::FixedBudget {
        println!("  rate:      {:.6} per draw", stats.hit_rate());
    }
}

fn print_usage() {
    println!(
        "Usage: sim-runner [--config FILE] [--goal first_hit|first_up|fixed_budget] [--trials N]\n\
         \x20                 [--p P] [--pity N] [--start N | --start-pct F] [--target F]\n\
         \x20                 [--easing linear|easeOutQuad|easeInOutCubic] [--cushion N]\n\
         \x20                 [--off-probs a,b,c] [--max-off N] [--budget N] [--seed S]\n\
         \x20                 [--threads N] [--json]"
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
