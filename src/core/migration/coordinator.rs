use super::completion::{Completion, CompletionTracker};
use super::task::{TaskSettings, TwinMigrationTask};
use crate::core::model::PublishedSet;
use crate::core::types::PatchFailurePolicy;
use crate::twins::TwinService;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use twin_migrate_types::{MigrationReport, ModelReport, TaskOutcome};
use uuid::Uuid;

/// Run-wide migration options resolved from config and CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    pub patch_failure_policy: PatchFailurePolicy,
    pub dry_run: bool,
    /// Cancel every outstanding task once this much time has passed.
    pub max_runtime: Option<Duration>,
}

/// Coordinator-side view of one spawned task.
struct TaskRecord {
    handle: Option<JoinHandle<()>>,
    terminal: bool,
    report: ModelReport,
}

impl TaskRecord {
    fn finish(&mut self, report: Option<ModelReport>) {
        if self.terminal {
            return;
        }
        self.terminal = true;
        self.handle = None;
        match report {
            Some(report) => self.report = report,
            None => {
                self.report.outcome = TaskOutcome::Failed;
                self.report.cause =
                    Some("task terminated without reporting an outcome".to_string());
            }
        }
    }
}

/// Runs one [`TwinMigrationTask`] per published model, all concurrently, and
/// waits for every one of them to reach a terminal state.
pub struct MigrationCoordinator {
    service: Arc<dyn TwinService>,
    options: MigrationOptions,
    cancel: CancellationToken,
}

impl MigrationCoordinator {
    pub fn new(service: Arc<dyn TwinService>, options: MigrationOptions) -> Self {
        MigrationCoordinator {
            service,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Token that cancels every in-flight task when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Migrate every model in `models` and report once all tasks are terminal.
    ///
    /// Failures never short-circuit the wait; the report always carries one
    /// entry per model, in batch order.
    pub async fn run_all(&self, models: &PublishedSet) -> MigrationReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let settings = TaskSettings {
            patch_failure_policy: self.options.patch_failure_policy,
            dry_run: self.options.dry_run,
        };

        let (tracker, mut waiter) = CompletionTracker::new();
        let mut records: Vec<TaskRecord> = Vec::with_capacity(models.len());
        for (index, model_id) in models.model_ids().into_iter().enumerate() {
            let task = TwinMigrationTask::new(
                model_id.clone(),
                Arc::clone(&self.service),
                settings,
                self.cancel.clone(),
            );
            let signal = tracker.signal(index);
            let span = tracing::info_span!("migrate_model", %run_id, model_id = %model_id);
            let handle = tokio::spawn(
                async move {
                    let report = task.run().await;
                    signal.complete(report);
                }
                .instrument(span),
            );
            records.push(TaskRecord {
                handle: Some(handle),
                terminal: false,
                report: ModelReport::pending(model_id),
            });
        }
        drop(tracker);
        tracing::info!(%run_id, tasks = records.len(), "migration tasks started");

        let deadline = self
            .options
            .max_runtime
            .map(|limit| tokio::time::Instant::now() + limit);
        let mut remaining = records.len();
        while remaining > 0 {
            let Some(Completion { index, report }) =
                self.next_completion(&mut waiter, deadline).await
            else {
                break;
            };
            if let Some(record) = records.get_mut(index) {
                if !record.terminal {
                    record.finish(report);
                    remaining -= 1;
                }
            }
        }
        for record in records.iter_mut().filter(|record| !record.terminal) {
            if let Some(handle) = record.handle.take() {
                handle.abort();
            }
            record.finish(None);
        }
        let elapsed_millis = i64::try_from(clock.elapsed().as_millis()).unwrap_or(i64::MAX);

        let report = MigrationReport::from_entries(
            run_id,
            started_at,
            self.options.dry_run,
            elapsed_millis,
            records.into_iter().map(|record| record.report).collect(),
        );
        tracing::info!(
            %run_id,
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.elapsed_millis,
            "migration finished"
        );
        report
    }

    async fn next_completion(
        &self,
        waiter: &mut super::completion::CompletionWaiter,
        deadline: Option<tokio::time::Instant>,
    ) -> Option<Completion> {
        match deadline {
            Some(deadline) if !self.cancel.is_cancelled() => {
                tokio::select! {
                    completion = waiter.next() => completion,
                    _ = tokio::time::sleep_until(deadline) => {
                        tracing::warn!("maximum runtime reached; cancelling outstanding migrations");
                        self.cancel.cancel();
                        waiter.next().await
                    }
                }
            }
            _ => waiter.next().await,
        }
    }
}
