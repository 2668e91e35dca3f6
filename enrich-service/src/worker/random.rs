//! Random draws used by the worker
//!
//! Every draw names what it is for, so a scripted source can answer
//! deterministically no matter how concurrent runners interleave.

use crate::models::JobType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// What a random sample is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draw {
    /// Provider round-trip time within the configured window
    Latency { job: JobType, attempt: usize },
    /// Whether the provider at `attempt` (0-based) finds the value
    Success { job: JobType, attempt: usize },
    /// Third-party profile lookup time
    ProfileLookup,
}

/// Source of uniform samples in `[0, 1)`
pub trait RandomSource: Send + Sync {
    fn sample(&self, draw: Draw) -> f64;
}

/// Thread-safe generator, seeded for reproducible runs or from entropy
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng: Mutex::new(rng) }
    }
}

impl RandomSource for SeededRandom {
    fn sample(&self, _draw: Draw) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        rng.gen::<f64>()
    }
}

/// Source answering every draw through a function
pub struct ScriptedRandom<F> {
    script: F,
}

impl<F> ScriptedRandom<F>
where
    F: Fn(Draw) -> f64 + Send + Sync,
{
    pub fn new(script: F) -> Self {
        Self { script }
    }
}

impl<F> RandomSource for ScriptedRandom<F>
where
    F: Fn(Draw) -> f64 + Send + Sync,
{
    fn sample(&self, draw: Draw) -> f64 {
        (self.script)(draw)
    }
}
