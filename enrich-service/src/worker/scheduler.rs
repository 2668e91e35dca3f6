//! Polling loop that promotes due pending enrichments

use super::orchestrator::Orchestrator;
use super::WorkerContext;
use enrich_common::Result;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

pub struct Scheduler {
    ctx: Arc<WorkerContext>,
    orchestrator: Orchestrator,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Orchestrator runs are spawned on `tracker`; the loop exits when
    /// `cancel` fires
    pub fn new(ctx: Arc<WorkerContext>, tracker: TaskTracker, cancel: CancellationToken) -> Self {
        Self {
            orchestrator: Orchestrator::new(ctx.clone()),
            ctx,
            tracker,
            cancel,
        }
    }

    /// Promote every due pending record and launch its orchestration
    ///
    /// Returns the number of enrichments launched. Does not wait for them.
    pub async fn tick(&self) -> Result<usize> {
        let due = self
            .ctx
            .store
            .list_due_pending(self.ctx.config.promotion_delay())
            .await?;

        let mut launched = 0;
        for enrichment in due {
            let plan = match self.orchestrator.promote(&enrichment).await {
                Ok(Some(plan)) => plan,
                Ok(None) => continue,
                Err(e) => {
                    error!(enrichment_id = %enrichment.id, "Failed to promote enrichment: {}", e);
                    continue;
                }
            };

            let orchestrator = self.orchestrator.clone();
            let id = enrichment.id;
            self.tracker.spawn(async move {
                if let Err(e) = orchestrator.execute(plan).await {
                    error!(enrichment_id = %id, "Enrichment processing failed: {}", e);
                }
            });
            launched += 1;
        }

        if launched > 0 {
            debug!("Launched {} enrichments", launched);
        }
        Ok(launched)
    }

    /// Tick immediately, then every poll interval until cancelled
    ///
    /// A tick in progress always finishes before the loop observes
    /// cancellation. In-flight orchestrations are left running.
    pub async fn run(self) {
        info!(
            poll_interval_ms = self.ctx.config.poll_interval_ms,
            promotion_delay_ms = self.ctx.config.promotion_delay_ms,
            "Starting enrichment scheduler"
        );

        let mut ticker = interval(self.ctx.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("Error fetching pending enrichments: {}", e);
                    }
                }
            }
        }

        info!("Stopping enrichment scheduler");
    }
}
