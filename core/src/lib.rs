//! Gacha draw engine: hard pity, soft-pity ramp, banner UP/off rules, and a
//! Monte Carlo simulator over them.
//!
//! Layering, leaves first:
//!   rng -> draw -> pity -> soft_pity -> banner -> engine -> simulation -> stats

pub mod banner;
pub mod config;
pub mod draw;
pub mod engine;
pub mod error;
pub mod pity;
pub mod rng;
pub mod session;
pub mod simulation;
pub mod soft_pity;
pub mod stats;

pub use banner::{BannerOutcome, BannerSystem};
pub use engine::{BannerParams, EngineSpec, GachaEngine, RampParams};
pub use error::{GachaError, GachaResult};
pub use pity::PitySystem;
pub use rng::{EntropySource, RandomSource, SeededSource};
pub use simulation::{run_monte_carlo, run_monte_carlo_seeded, SimBudget, SimParams, TrialGoal};
pub use soft_pity::{Easing, SoftPityConfig, SoftPitySystem};
pub use stats::Stats;
