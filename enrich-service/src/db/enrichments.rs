//! Enrichment store
//!
//! One row per enrichment. Single-field updates are single SQL statements
//! built on `json_set`/`json_remove`, so writes for different job types on
//! the same record never clobber each other. Every mutation also holds a
//! per-enrichment async mutex; read-modify-write operations additionally run
//! in an immediate (write-locked) transaction. Locks are never held across provider latency, only for
//! the duration of one store call.

use crate::models::{ContactHint, Enrichment, EnrichmentStatus, JobType};
use chrono::{DateTime, Utc};
use enrich_common::time::{from_db_string, to_db_string};
use enrich_common::{uuid_utils, Clock, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Statuses in which per-job fields may still change
const MUTABLE_STATUSES: &str = "('pending', 'in_progress')";

/// Outcome of [`EnrichmentStore::mark_job_completed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Job added to the completed set, other jobs still outstanding
    Recorded,
    /// Job was already in the completed set
    AlreadyRecorded,
    /// Every requested job is now complete and the record flipped to `completed`
    EnrichmentCompleted,
    /// Record is terminal; nothing changed
    Ignored,
}

/// Durable enrichment records
#[derive(Clone)]
pub struct EnrichmentStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl EnrichmentStore {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn now_string(&self) -> String {
        to_db_string(self.clock.now())
    }

    /// Transaction holding the write lock from its first statement
    ///
    /// A deferred transaction that reads before writing gets
    /// SQLITE_BUSY_SNAPSHOT if another connection commits in between, and the
    /// busy timeout never retries that.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Serialize mutations of one record; other ids are unaffected
    async fn lock_record(&self, id: Uuid) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| Error::Internal("Record lock table poisoned".to_string()))?;
            // Drop entries nobody is holding or waiting on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id).or_default().clone()
        };
        Ok(lock.lock_owned().await)
    }

    /// Create a pending enrichment
    ///
    /// An empty job set defaults to `{phone}`.
    pub async fn create(
        &self,
        subject_id: &str,
        requested_jobs: BTreeSet<JobType>,
        contact_hint: Option<ContactHint>,
    ) -> Result<Enrichment> {
        let requested_jobs = if requested_jobs.is_empty() {
            BTreeSet::from([JobType::Phone])
        } else {
            requested_jobs
        };

        let now = self.clock.now();
        let enrichment = Enrichment {
            id: uuid_utils::generate(),
            subject_id: subject_id.to_string(),
            status: EnrichmentStatus::Pending,
            requested_jobs,
            completed_jobs: BTreeSet::new(),
            result: BTreeMap::new(),
            current_provider_by_job: BTreeMap::new(),
            contact_hint,
            is_static: false,
            created_at: now,
            updated_at: now,
        };

        self.insert(&enrichment).await?;
        debug!(enrichment_id = %enrichment.id, subject_id, "Created enrichment");

        Ok(enrichment)
    }

    /// Insert a fully formed record, skipping ids that already exist
    pub(crate) async fn insert(&self, enrichment: &Enrichment) -> Result<bool> {
        let hint = enrichment
            .contact_hint
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO enrichments (
                id, subject_id, status, created_at, updated_at, result, job_providers,
                requested_jobs, completed_jobs, contact_hint, is_static
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(enrichment.id.to_string())
        .bind(&enrichment.subject_id)
        .bind(enrichment.status.as_str())
        .bind(to_db_string(enrichment.created_at))
        .bind(to_db_string(enrichment.updated_at))
        .bind(encode_map(&enrichment.result)?)
        .bind(encode_map(&enrichment.current_provider_by_job)?)
        .bind(serde_json::to_string(&enrichment.requested_jobs)?)
        .bind(serde_json::to_string(&enrichment.completed_jobs)?)
        .bind(hint)
        .bind(enrichment.is_static)
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        Ok(inserted)
    }

    /// Load an enrichment
    pub async fn get(&self, id: Uuid) -> Result<Option<Enrichment>> {
        let row = sqlx::query("SELECT * FROM enrichments WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_enrichment).transpose()
    }

    /// Number of stored enrichments
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrichments")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Move a record to `status`, optionally replacing the whole result map
    ///
    /// Only lifecycle transitions are accepted (see
    /// [`EnrichmentStatus::can_transition_to`]). Moving to `completed` clears
    /// every provider pointer.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: EnrichmentStatus,
        result: Option<&BTreeMap<JobType, String>>,
    ) -> Result<()> {
        let _guard = self.lock_record(id).await?;
        let mut tx = self.begin_write().await?;

        let current: Option<String> = sqlx::query_scalar("SELECT status FROM enrichments WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let current: EnrichmentStatus = current
            .ok_or_else(|| Error::NotFound(format!("Enrichment {}", id)))?
            .parse()?;

        if !current.can_transition_to(status) {
            return Err(Error::InvalidInput(format!(
                "Enrichment {} cannot move from {} to {}",
                id, current, status
            )));
        }

        let result = result.map(encode_map).transpose()?;

        sqlx::query(
            r#"
            UPDATE enrichments
            SET status = ?,
                result = COALESCE(?, result),
                job_providers = CASE WHEN ? = 'completed' THEN '{}' ELSE job_providers END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(result)
        .bind(status.as_str())
        .bind(self.now_string())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(enrichment_id = %id, from = %current, to = %status, "Status changed");
        Ok(())
    }

    /// Point one job at the provider it is querying, or clear the pointer
    ///
    /// Ignored for terminal records, and for completed jobs when setting.
    pub async fn set_job_provider(
        &self,
        id: Uuid,
        job: JobType,
        provider_id: Option<&str>,
    ) -> Result<()> {
        let _guard = self.lock_record(id).await?;

        let updated = match provider_id {
            Some(provider_id) => {
                sqlx::query(&format!(
                    r#"
                    UPDATE enrichments
                    SET job_providers = json_set(job_providers, ?, ?),
                        updated_at = ?
                    WHERE id = ?
                      AND status IN {}
                      AND NOT EXISTS (
                          SELECT 1 FROM json_each(enrichments.completed_jobs)
                          WHERE json_each.value = ?
                      )
                    "#,
                    MUTABLE_STATUSES
                ))
                .bind(json_path(job))
                .bind(provider_id)
                .bind(self.now_string())
                .bind(id.to_string())
                .bind(job.as_str())
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    UPDATE enrichments
                    SET job_providers = json_remove(job_providers, ?),
                        updated_at = ?
                    WHERE id = ? AND status IN {}
                    "#,
                    MUTABLE_STATUSES
                ))
                .bind(json_path(job))
                .bind(self.now_string())
                .bind(id.to_string())
                .execute(&self.pool)
                .await?
            }
        };

        if updated.rows_affected() == 0 {
            self.ensure_exists(id).await?;
            debug!(enrichment_id = %id, job = %job, "Provider pointer update ignored");
        }
        Ok(())
    }

    /// Write one job's result value
    ///
    /// A found (non-empty) value is never overwritten with an empty one, and
    /// terminal records are left untouched.
    pub async fn set_result_field(&self, id: Uuid, job: JobType, value: &str) -> Result<()> {
        let _guard = self.lock_record(id).await?;
        let path = json_path(job);

        let updated = sqlx::query(&format!(
            r#"
            UPDATE enrichments
            SET result = json_set(result, ?, ?),
                updated_at = ?
            WHERE id = ?
              AND status IN {}
              AND (? <> '' OR COALESCE(json_extract(result, ?), '') = '')
            "#,
            MUTABLE_STATUSES
        ))
        .bind(&path)
        .bind(value)
        .bind(self.now_string())
        .bind(id.to_string())
        .bind(value)
        .bind(&path)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            self.ensure_exists(id).await?;
            debug!(enrichment_id = %id, job = %job, "Result update ignored");
        }
        Ok(())
    }

    /// Record a terminal outcome for one job
    ///
    /// Idempotent. When the completed set reaches the requested set on an
    /// `in_progress` record, the record flips to `completed` and all provider
    /// pointers are cleared in the same transaction. A job missing from the
    /// result map is recorded as not found (`""`).
    pub async fn mark_job_completed(&self, id: Uuid, job: JobType) -> Result<Completion> {
        let _guard = self.lock_record(id).await?;
        let mut tx = self.begin_write().await?;

        let row = sqlx::query("SELECT status, requested_jobs, completed_jobs FROM enrichments WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Enrichment {}", id)))?;

        let status: EnrichmentStatus = row.try_get::<String, _>("status")?.parse()?;
        let requested: BTreeSet<JobType> =
            serde_json::from_str(&row.try_get::<String, _>("requested_jobs")?)?;
        let mut completed: BTreeSet<JobType> =
            serde_json::from_str(&row.try_get::<String, _>("completed_jobs")?)?;

        if status == EnrichmentStatus::Failed {
            return Ok(Completion::Ignored);
        }
        if !requested.contains(&job) {
            return Err(Error::InvalidInput(format!(
                "Job {} was not requested for enrichment {}",
                job, id
            )));
        }

        if status == EnrichmentStatus::Completed {
            return Ok(if completed.contains(&job) {
                Completion::AlreadyRecorded
            } else {
                Completion::Ignored
            });
        }

        // An already-recorded job still re-checks closure so a repeat call can finish the record
        let newly_recorded = completed.insert(job);
        let finished = status == EnrichmentStatus::InProgress && requested.is_subset(&completed);
        if !newly_recorded && !finished {
            return Ok(Completion::AlreadyRecorded);
        }

        let path = json_path(job);
        sqlx::query(
            r#"
            UPDATE enrichments
            SET completed_jobs = ?,
                result = json_insert(result, ?, ''),
                job_providers = CASE WHEN ? THEN '{}' ELSE json_remove(job_providers, ?) END,
                status = CASE WHEN ? THEN 'completed' ELSE status END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(serde_json::to_string(&completed)?)
        .bind(&path)
        .bind(finished)
        .bind(&path)
        .bind(finished)
        .bind(self.now_string())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if finished {
            debug!(enrichment_id = %id, job = %job, "All jobs complete, enrichment completed");
            Ok(Completion::EnrichmentCompleted)
        } else {
            debug!(enrichment_id = %id, job = %job, "Job completed");
            Ok(Completion::Recorded)
        }
    }

    /// Non-static pending records created at least `older_than` ago, oldest first
    pub async fn list_due_pending(&self, older_than: Duration) -> Result<Vec<Enrichment>> {
        let older_than = chrono::Duration::from_std(older_than)
            .map_err(|e| Error::InvalidInput(format!("Promotion delay out of range: {}", e)))?;
        let cutoff = to_db_string(self.clock.now() - older_than);

        let rows = sqlx::query(
            r#"
            SELECT * FROM enrichments
            WHERE status = 'pending' AND is_static = 0 AND created_at <= ?
            ORDER BY created_at
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_enrichment).collect()
    }

    async fn ensure_exists(&self, id: Uuid) -> Result<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM enrichments WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        exists
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("Enrichment {}", id)))
    }
}

fn json_path(job: JobType) -> String {
    format!("$.{}", job.as_str())
}

fn encode_map(map: &BTreeMap<JobType, String>) -> Result<String> {
    let keyed: BTreeMap<&str, &str> = map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    Ok(serde_json::to_string(&keyed)?)
}

/// Decode a job-keyed JSON object, skipping keys that are not job types
fn decode_map(json: &str) -> Result<BTreeMap<JobType, String>> {
    let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| k.parse::<JobType>().ok().map(|job| (job, v)))
        .collect())
}

fn row_to_enrichment(row: &SqliteRow) -> Result<Enrichment> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Stored enrichment id '{}' is invalid: {}", id, e)))?;

    let contact_hint: Option<String> = row.try_get("contact_hint")?;
    let contact_hint = contact_hint
        .as_deref()
        .map(serde_json::from_str::<ContactHint>)
        .transpose()?;

    Ok(Enrichment {
        id,
        subject_id: row.try_get("subject_id")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        requested_jobs: serde_json::from_str(&row.try_get::<String, _>("requested_jobs")?)?,
        completed_jobs: serde_json::from_str(&row.try_get::<String, _>("completed_jobs")?)?,
        result: decode_map(&row.try_get::<String, _>("result")?)?,
        current_provider_by_job: decode_map(&row.try_get::<String, _>("job_providers")?)?,
        contact_hint,
        is_static: row.try_get::<i64, _>("is_static")? != 0,
        created_at: from_db_string(&row.try_get::<String, _>("created_at")?)?,
        updated_at: from_db_string(&row.try_get::<String, _>("updated_at")?)?,
    })
}
