//! Per-session engine registry.
//!
//! Each session id owns exactly one engine behind its own mutex, so
//! concurrent callers on different sessions never contend and callers on the
//! same session are serialized. The registry map lock is held only for
//! lookup and insert, never across draws.
//!
//! A session remembers the EngineSpec it was built from. A request carrying
//! a different spec rebuilds the engine, which resets all counters.

use crate::{
    banner::BannerOutcome,
    engine::{EngineSpec, GachaEngine},
    error::GachaResult,
    rng::{EntropySource, RandomSource, TrialRngBank},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

pub type SessionSource = Box<dyn RandomSource + Send>;
pub type SessionEngine = GachaEngine<SessionSource>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionCounters {
    pub miss_streak: u32,
    pub off_streak: u32,
    pub guaranteed_next: bool,
}

/// Result of one batch of draws on a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<BannerOutcome>,
    pub counters: SessionCounters,
}

impl BatchReport {
    pub fn hits(&self) -> Vec<bool> {
        self.outcomes.iter().map(|o| o.hit).collect()
    }
}

pub struct Session {
    spec: EngineSpec,
    engine: SessionEngine,
}

impl Session {
    pub fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    pub fn counters(&self) -> SessionCounters {
        SessionCounters {
            miss_streak: self.engine.miss_streak(),
            off_streak: self.engine.off_streak(),
            guaranteed_next: self.engine.guaranteed_next(),
        }
    }
}

enum SourceMode {
    Entropy,
    Seeded { bank: TrialRngBank, issued: AtomicU64 },
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
    sources: SourceMode,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A poisoned lock only means another caller panicked mid-draw; the
/// counters are still plain integers, so keep serving.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionRegistry {
    /// Registry whose engines draw from OS entropy.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            sources: SourceMode::Entropy,
        }
    }

    /// Registry whose engines get reproducible streams, one per engine built,
    /// in build order.
    pub fn seeded(seed: u64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            sources: SourceMode::Seeded {
                bank: TrialRngBank::new(seed),
                issued: AtomicU64::new(0),
            },
        }
    }

    fn next_source(&self) -> SessionSource {
        match &self.sources {
            SourceMode::Entropy => Box::new(EntropySource::new()),
            SourceMode::Seeded { bank, issued } => {
                let n = issued.fetch_add(1, Ordering::Relaxed);
                Box::new(bank.for_trial(n))
            }
        }
    }

    fn resolve(&self, session_id: &str, spec: &EngineSpec) -> GachaResult<Arc<Mutex<Session>>> {
        let mut sessions = lock(&self.sessions);
        if let Some(existing) = sessions.get(session_id) {
            return Ok(Arc::clone(existing));
        }
        let engine = spec.build(self.next_source())?;
        log::info!("session {session_id}: created (pity={}, banner={})", spec.pity, spec.has_banner());
        let session = Arc::new(Mutex::new(Session {
            spec: spec.clone(),
            engine,
        }));
        sessions.insert(session_id.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Perform `n` draws on the session's engine, creating it on first use
    /// and rebuilding it when `spec` changed. A spec that fails to build
    /// leaves any existing session untouched.
    pub fn draw(
        &self,
        session_id: &str,
        spec: &EngineSpec,
        p_base: f64,
        n: usize,
    ) -> GachaResult<BatchReport> {
        let handle = self.resolve(session_id, spec)?;
        let mut session = lock(&handle);
        if session.spec != *spec {
            let engine = spec.build(self.next_source())?;
            log::warn!("session {session_id}: spec changed, engine rebuilt and counters reset");
            *session = Session {
                spec: spec.clone(),
                engine,
            };
        }
        let outcomes = session.engine.draw_n(p_base, n)?;
        Ok(BatchReport {
            outcomes,
            counters: session.counters(),
        })
    }

    pub fn counters(&self, session_id: &str) -> Option<SessionCounters> {
        let handle = lock(&self.sessions).get(session_id).cloned()?;
        let session = lock(&handle);
        Some(session.counters())
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, session_id: &str) -> bool {
        lock(&self.sessions).remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
