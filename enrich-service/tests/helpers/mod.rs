//! Shared fixtures for enrich-service integration tests
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use enrich_common::config::WorkerConfig;
use enrich_common::db::init_database;
use enrich_common::time::ManualClock;
use enrich_common::{Clock, SystemClock};
use enrich_service::db::EnrichmentStore;
use enrich_service::directory::{seed_providers, Directory, SeedDirectory};
use enrich_service::models::{JobType, Profile, Subject, SubjectAttributes};
use enrich_service::worker::{Draw, RandomSource, ScriptedRandom};
use enrich_service::EnrichmentService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const SUBJECT_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";
pub const SUBJECT_PHONE: &str = "+1-555-0100";

pub async fn memory_store() -> EnrichmentStore {
    store_with_clock(Arc::new(SystemClock)).await
}

pub async fn store_with_clock(clock: Arc<dyn Clock>) -> EnrichmentStore {
    let pool = init_database(":memory:").await.unwrap();
    EnrichmentStore::new(pool, clock)
}

/// Store on a WAL database file inside `dir`, using the full connection pool
pub async fn file_store(dir: &tempfile::TempDir) -> EnrichmentStore {
    let path = dir.path().join("enrich.db");
    let pool = init_database(path.to_str().unwrap()).await.unwrap();
    EnrichmentStore::new(pool, Arc::new(SystemClock))
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()))
}

/// Zero latency, immediate promotion, fast polling
pub fn fast_config() -> WorkerConfig {
    WorkerConfig {
        poll_interval_ms: 10,
        promotion_delay_ms: 0,
        latency_min_ms: 0,
        latency_max_ms: 0,
        lookup_latency_min_ms: 0,
        lookup_latency_max_ms: 0,
        ..WorkerConfig::default()
    }
}

pub fn subject() -> Subject {
    Subject {
        id: SUBJECT_ID.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: String::new(),
        phone: String::new(),
        company: Some("Analytical Engines".to_string()),
        job_title: None,
    }
}

pub fn profile() -> Profile {
    Profile {
        full_name: "Ada Lovelace".to_string(),
        linkedin_url: "https://linkedin.com/in/ada".to_string(),
        twitter_handle: String::new(),
        github_username: "ada".to_string(),
        bio: String::new(),
        location: "London".to_string(),
        skills: vec!["Mathematics".to_string(), "Poetry".to_string()],
        companies: vec!["Analytical Engines".to_string()],
    }
}

/// Subject with a phone on record and no email, six providers
pub fn phone_only_directory() -> SeedDirectory {
    SeedDirectory::empty()
        .with_providers(seed_providers())
        .with_subject(
            subject(),
            SubjectAttributes {
                phone: Some(SUBJECT_PHONE.to_string()),
                email: None,
            },
        )
        .with_profile(profile())
}

/// Subject with both phone and email on record, six providers
pub fn full_directory() -> SeedDirectory {
    SeedDirectory::empty()
        .with_providers(seed_providers())
        .with_subject(
            subject(),
            SubjectAttributes {
                phone: Some(SUBJECT_PHONE.to_string()),
                email: Some("ada@engines.org".to_string()),
            },
        )
        .with_profile(profile())
}

/// Succeeds only at the given provider position
pub fn succeed_at(position: usize) -> Arc<dyn RandomSource> {
    Arc::new(ScriptedRandom::new(move |draw: Draw| match draw {
        Draw::Success { attempt, .. } if attempt == position => 0.0,
        Draw::Success { .. } => 0.99,
        Draw::Latency { .. } | Draw::ProfileLookup => 0.0,
    }))
}

/// Never succeeds
pub fn never_succeed() -> Arc<dyn RandomSource> {
    Arc::new(ScriptedRandom::new(|draw: Draw| match draw {
        Draw::Success { .. } => 0.99,
        Draw::Latency { .. } | Draw::ProfileLookup => 0.0,
    }))
}

/// Answers every draw with a fixed value and records the draws made
pub struct RecordingRandom {
    value: f64,
    draws: Mutex<Vec<Draw>>,
    count: AtomicUsize,
}

impl RecordingRandom {
    pub fn new(value: f64) -> Arc<Self> {
        Arc::new(Self {
            value,
            draws: Mutex::new(Vec::new()),
            count: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn draws(&self) -> Vec<Draw> {
        self.draws.lock().unwrap().clone()
    }
}

impl RandomSource for RecordingRandom {
    fn sample(&self, draw: Draw) -> f64 {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.draws.lock().unwrap().push(draw);
        self.value
    }
}

pub fn service(
    store: EnrichmentStore,
    directory: impl Directory + 'static,
    config: WorkerConfig,
    random: Arc<dyn RandomSource>,
) -> EnrichmentService {
    EnrichmentService::new(store, Arc::new(directory), config, random)
}

/// Poll until the enrichment reaches a terminal status
pub async fn wait_terminal(service: &EnrichmentService, id: Uuid) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let e = service.get_enrichment(id).await.unwrap().unwrap();
            if e.status.is_terminal() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("enrichment did not finish in time");
}

pub fn jobs(list: &[JobType]) -> std::collections::BTreeSet<JobType> {
    list.iter().copied().collect()
}
