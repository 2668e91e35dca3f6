//! Worker integration tests
//!
//! Scenarios run with zero latency and scripted random draws so outcomes
//! are exact.

mod helpers;

use enrich_common::config::WorkerConfig;
use enrich_common::Result;
use enrich_service::directory::{seed_providers, Directory, SeedDirectory, PROVIDER_STARTUPDEV};
use enrich_service::models::{
    ContactHint, EnrichmentStatus, JobType, Profile, Provider, Subject, SubjectAttributes,
};
use enrich_service::worker::{Draw, JobOutcome, JobRunner, Preflight, WorkerContext};
use helpers::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

fn matching_hint() -> ContactHint {
    ContactHint {
        linkedin_url: Some("https://LinkedIn.com/in/ada".to_string()),
        github_username: Some("ada".to_string()),
        location: Some("london".to_string()),
        skills: vec!["poetry".to_string(), "Mathematics".to_string()],
        ..ContactHint::default()
    }
}

#[tokio::test]
async fn test_found_on_third_provider_and_email_exhausted() {
    let store = memory_store().await;
    let service = service(store, phone_only_directory(), fast_config(), succeed_at(2));

    let e = service
        .create_enrichment(SUBJECT_ID, jobs(&[JobType::Phone, JobType::Email]), None)
        .await
        .unwrap();

    assert_eq!(service.scheduler().tick().await.unwrap(), 1);
    service.wait_idle().await;

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Completed);
    assert_eq!(e.result[&JobType::Phone], SUBJECT_PHONE);
    assert_eq!(e.result[&JobType::Email], "");
    assert_eq!(e.completed_jobs, jobs(&[JobType::Phone, JobType::Email]));
    assert!(e.current_provider_by_job.is_empty());

    // Discovered value is visible on the subject afterwards
    let subject = service.directory().find_subject(SUBJECT_ID).unwrap().unwrap();
    assert_eq!(subject.phone, SUBJECT_PHONE);
    assert_eq!(subject.email, "");
}

#[tokio::test]
async fn test_runner_reports_provider_that_found_value() {
    let store = memory_store().await;
    let e = store
        .create(SUBJECT_ID, jobs(&[JobType::Phone]), None)
        .await
        .unwrap();
    store
        .set_status(e.id, EnrichmentStatus::InProgress, None)
        .await
        .unwrap();

    let ctx = Arc::new(WorkerContext::new(
        store.clone(),
        Arc::new(phone_only_directory()),
        fast_config(),
        succeed_at(2),
    ));
    let providers: Arc<[Provider]> = seed_providers().into();

    let outcome = JobRunner::new(ctx, e.id, SUBJECT_ID.to_string(), JobType::Phone, providers, 0.2)
        .run()
        .await
        .unwrap();

    assert_eq!(
        outcome,
        JobOutcome::Found {
            provider_id: PROVIDER_STARTUPDEV.to_string()
        }
    );
    let e = store.get(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Completed);
}

#[tokio::test]
async fn test_exhaustion_yields_empty_results() {
    let store = memory_store().await;
    let service = service(store, full_directory(), fast_config(), never_succeed());

    let e = service
        .create_enrichment(SUBJECT_ID, jobs(&[JobType::Phone, JobType::Email]), None)
        .await
        .unwrap();
    service.orchestrator().run(e.id).await.unwrap();

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Completed);
    assert_eq!(e.result.get(&JobType::Phone).map(String::as_str), Some(""));
    assert_eq!(e.result.get(&JobType::Email).map(String::as_str), Some(""));
}

#[tokio::test]
async fn test_empty_provider_list_fails_without_runners() {
    let directory = SeedDirectory::empty().with_subject(
        subject(),
        SubjectAttributes {
            phone: Some(SUBJECT_PHONE.to_string()),
            email: None,
        },
    );
    let random = RecordingRandom::new(0.0);
    let service = service(memory_store().await, directory, fast_config(), random.clone());

    let e = service
        .create_enrichment(SUBJECT_ID, jobs(&[JobType::Phone]), None)
        .await
        .unwrap();
    assert_eq!(service.scheduler().tick().await.unwrap(), 0);
    service.wait_idle().await;

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Failed);
    assert!(e.result.is_empty());
    assert!(e.completed_jobs.is_empty());
    assert_eq!(random.count(), 0, "no runner should have drawn");
}

#[tokio::test]
async fn test_unknown_subject_fails_with_no_pointers() {
    let random = RecordingRandom::new(0.0);
    let service = service(memory_store().await, full_directory(), fast_config(), random.clone());

    let e = service
        .create_enrichment("no-such-subject", jobs(&[JobType::Phone, JobType::Email]), None)
        .await
        .unwrap();
    assert_eq!(service.scheduler().tick().await.unwrap(), 0);

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Failed);
    assert!(e.result.is_empty());
    assert!(e.current_provider_by_job.is_empty());
    assert_eq!(random.count(), 0);
}

#[tokio::test]
async fn test_in_progress_record_fails_when_subject_unknown() {
    let service = service(memory_store().await, full_directory(), fast_config(), never_succeed());
    let e = service
        .create_enrichment("no-such-subject", jobs(&[JobType::Phone]), None)
        .await
        .unwrap();
    service
        .store()
        .set_status(e.id, EnrichmentStatus::InProgress, None)
        .await
        .unwrap();

    service.orchestrator().run(e.id).await.unwrap();

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Failed);
}

#[tokio::test]
async fn test_matching_hint_boosts_both_jobs() {
    // 0.5 misses at the base rate (0.2) and hits at the boosted rate (0.8)
    let random = RecordingRandom::new(0.5);
    let service = service(memory_store().await, full_directory(), fast_config(), random.clone());

    let e = service
        .create_enrichment(
            SUBJECT_ID,
            jobs(&[JobType::Phone, JobType::Email]),
            Some(matching_hint()),
        )
        .await
        .unwrap();

    let enrichment = service.get_enrichment(e.id).await.unwrap().unwrap();
    match service.orchestrator().preflight(&enrichment).unwrap() {
        Preflight::Ready(plan) => {
            assert!(plan.boosted);
            assert_eq!(plan.success_rate, 0.8);
        }
        Preflight::Rejected(reason) => panic!("unexpected rejection: {}", reason),
    }

    service.orchestrator().run(e.id).await.unwrap();

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Completed);
    assert_eq!(e.result[&JobType::Phone], SUBJECT_PHONE);
    assert_eq!(e.result[&JobType::Email], "ada@engines.org");

    // Both runners hit on the first provider
    let success_draws: Vec<Draw> = random
        .draws()
        .into_iter()
        .filter(|d| matches!(d, Draw::Success { .. }))
        .collect();
    assert_eq!(success_draws.len(), 2);
    assert!(success_draws
        .iter()
        .all(|d| matches!(d, Draw::Success { attempt: 0, .. })));
}

#[tokio::test]
async fn test_mismatched_hint_uses_base_rate() {
    let random = RecordingRandom::new(0.5);
    let service = service(memory_store().await, full_directory(), fast_config(), random.clone());

    let hint = ContactHint {
        github_username: Some("someone-else".to_string()),
        ..matching_hint()
    };
    let e = service
        .create_enrichment(SUBJECT_ID, jobs(&[JobType::Phone, JobType::Email]), Some(hint))
        .await
        .unwrap();

    service.orchestrator().run(e.id).await.unwrap();

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Completed);
    assert_eq!(e.result[&JobType::Phone], "");
    assert_eq!(e.result[&JobType::Email], "");
}

#[tokio::test]
async fn test_runner_stops_on_failed_enrichment() {
    let store = memory_store().await;
    let e = store.create(SUBJECT_ID, jobs(&[JobType::Phone]), None).await.unwrap();
    store
        .set_status(e.id, EnrichmentStatus::Failed, None)
        .await
        .unwrap();

    let random = RecordingRandom::new(0.0);
    let ctx = Arc::new(WorkerContext::new(
        store.clone(),
        Arc::new(full_directory()),
        fast_config(),
        random.clone(),
    ));

    let outcome = JobRunner::new(
        ctx,
        e.id,
        SUBJECT_ID.to_string(),
        JobType::Phone,
        seed_providers().into(),
        1.0,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(outcome, JobOutcome::Stopped);
    assert_eq!(random.count(), 0);
    let e = store.get(e.id).await.unwrap().unwrap();
    assert!(e.current_provider_by_job.is_empty());
}

/// Directory whose attribute lookup always faults
struct FaultyDirectory(SeedDirectory);

impl Directory for FaultyDirectory {
    fn find_subject(&self, subject_id: &str) -> Result<Option<Subject>> {
        self.0.find_subject(subject_id)
    }
    fn list_subjects(&self) -> Result<Vec<Subject>> {
        self.0.list_subjects()
    }
    fn find_subject_attributes(&self, _subject_id: &str) -> Result<Option<SubjectAttributes>> {
        Err(enrich_common::Error::Internal("attribute backend unavailable".to_string()))
    }
    fn find_profile(&self, subject_id: &str) -> Result<Option<Profile>> {
        self.0.find_profile(subject_id)
    }
    fn find_profile_by_name(&self, full_name: &str) -> Result<Option<Profile>> {
        self.0.find_profile_by_name(full_name)
    }
    fn list_providers(&self) -> Result<Vec<Provider>> {
        self.0.list_providers()
    }
    fn find_provider(&self, provider_id: &str) -> Result<Option<Provider>> {
        self.0.find_provider(provider_id)
    }
    fn record_resolved_attribute(&self, subject_id: &str, job: JobType, value: &str) -> Result<()> {
        self.0.record_resolved_attribute(subject_id, job, value)
    }
}

#[tokio::test]
async fn test_faulted_job_is_closed_by_orchestrator() {
    let service = service(
        memory_store().await,
        FaultyDirectory(full_directory()),
        fast_config(),
        succeed_at(0),
    );

    let e = service
        .create_enrichment(SUBJECT_ID, jobs(&[JobType::Phone]), None)
        .await
        .unwrap();
    service.orchestrator().run(e.id).await.unwrap();

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Completed);
    assert_eq!(e.result[&JobType::Phone], "");
    assert!(e.current_provider_by_job.is_empty());
}

#[tokio::test]
async fn test_static_records_are_never_promoted() {
    let store = memory_store().await;
    store.seed_static().await.unwrap();
    let service = service(store, SeedDirectory::seeded(), fast_config(), never_succeed());

    assert_eq!(service.scheduler().tick().await.unwrap(), 0);

    let pending = service
        .get_enrichment(enrich_service::db::STATIC_PENDING_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.status, EnrichmentStatus::Pending);
}

#[tokio::test]
async fn test_promotion_waits_for_delay() {
    let clock = manual_clock();
    let store = store_with_clock(clock.clone()).await;
    let config = WorkerConfig {
        promotion_delay_ms: 10_000,
        ..fast_config()
    };
    let service = service(store, full_directory(), config, never_succeed());

    let e = service
        .create_enrichment(SUBJECT_ID, jobs(&[JobType::Phone]), None)
        .await
        .unwrap();

    assert_eq!(service.scheduler().tick().await.unwrap(), 0);
    clock.advance(chrono::Duration::seconds(9));
    assert_eq!(service.scheduler().tick().await.unwrap(), 0);
    clock.advance(chrono::Duration::seconds(1));
    assert_eq!(service.scheduler().tick().await.unwrap(), 1);

    service.wait_idle().await;
    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Completed);
}

#[tokio::test]
async fn test_progress_is_monotonic_while_running() {
    let config = WorkerConfig {
        latency_min_ms: 1,
        latency_max_ms: 3,
        ..fast_config()
    };
    let service = service(memory_store().await, full_directory(), config, succeed_at(3));

    let e = service
        .create_enrichment(SUBJECT_ID, jobs(&[JobType::Phone, JobType::Email]), None)
        .await
        .unwrap();
    service.scheduler().tick().await.unwrap();

    let mut seen_completed: BTreeSet<JobType> = BTreeSet::new();
    let mut seen_found: Vec<(JobType, String)> = Vec::new();
    loop {
        let snapshot = service.get_enrichment(e.id).await.unwrap().unwrap();

        assert!(snapshot.completed_jobs.is_superset(&seen_completed));
        for (job, value) in &seen_found {
            assert_eq!(&snapshot.result[job], value);
        }

        seen_completed = snapshot.completed_jobs.clone();
        seen_found = snapshot
            .result
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (*k, v.clone()))
            .collect();

        if snapshot.status.is_terminal() {
            assert_eq!(snapshot.status, EnrichmentStatus::Completed);
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    service.wait_idle().await;
}

#[tokio::test]
async fn test_started_service_processes_until_stopped() {
    let service = service(memory_store().await, full_directory(), fast_config(), succeed_at(0));
    let handle = service.start();

    let e = service
        .create_enrichment(SUBJECT_ID, jobs(&[JobType::Email]), None)
        .await
        .unwrap();
    wait_terminal(&service, e.id).await;

    service.stop();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Completed);
    assert_eq!(e.result[&JobType::Email], "ada@engines.org");
}

#[tokio::test]
async fn test_stopped_service_promotes_nothing_new() {
    let service = service(memory_store().await, full_directory(), fast_config(), never_succeed());
    service.stop();
    service.start().await.unwrap();

    let e = service
        .create_enrichment(SUBJECT_ID, jobs(&[JobType::Phone]), None)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let e = service.get_enrichment(e.id).await.unwrap().unwrap();
    assert_eq!(e.status, EnrichmentStatus::Pending);
}
