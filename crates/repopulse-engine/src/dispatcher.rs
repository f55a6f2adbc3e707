use crate::digest::{self, Digest};
use crate::mailer::Mailer;
use crate::scheduler::{Job, Scheduler, Trigger};
use crate::tracker::ActivityTracker;
use crate::{Error, Result};
use futures_util::FutureExt;
use repopulse_ai::SummaryService;
use repopulse_core::{NotificationTask, TaskRequest, UpdateReport};
use repopulse_store::TaskStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a dispatch run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "digest", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The digest was handed to the mailer
    Delivered(Digest),
    /// Nothing new; no mail is sent
    NoUpdates,
    /// A digest was rendered but no mailer is configured
    Skipped(Digest),
}

/// Collect, detect, render and deliver for one task.
///
/// Shared by scheduled firings and manual execution so both follow the same
/// path.
pub struct DigestPipeline {
    tracker: Arc<ActivityTracker>,
    mailer: Option<Arc<dyn Mailer>>,
    summary: Option<SummaryService>,
    default_lookback: u32,
}

impl DigestPipeline {
    pub fn new(tracker: Arc<ActivityTracker>, mailer: Option<Arc<dyn Mailer>>, default_lookback: u32) -> Self {
        Self {
            tracker,
            mailer,
            summary: None,
            default_lookback,
        }
    }

    pub fn with_summary(mut self, summary: Option<SummaryService>) -> Self {
        self.summary = summary;
        self
    }

    /// Lookback used for a task's digests
    pub fn lookback_days(&self, task: &NotificationTask) -> u32 {
        task.cadence.lookback_days(self.default_lookback)
    }

    /// Render the digest a run of `task` would deliver right now
    pub async fn render(&self, task: &NotificationTask) -> Result<Option<Digest>> {
        let days = self.lookback_days(task);
        let reports = self
            .tracker
            .updates(task.repositories.iter().map(String::as_str), days)
            .await;

        let summary = self.summary_text(&reports).await;
        digest::render(&reports, days, summary.as_deref())
    }

    async fn summary_text(&self, reports: &[UpdateReport]) -> Option<String> {
        let service = self.summary.as_ref()?;
        let updated: Vec<UpdateReport> = reports.iter().filter(|r| r.has_updates).cloned().collect();
        if updated.is_empty() {
            return None;
        }

        match service.tracked_repos_summary(&updated).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Digest summary unavailable: {}", e);
                None
            }
        }
    }

    /// One full run: at most one delivery per call
    pub async fn run(&self, task: &NotificationTask) -> Result<DispatchOutcome> {
        info!(task = %task.id, repositories = task.repositories.len(), "Running notification task");

        let Some(digest) = self.render(task).await? else {
            info!(task = %task.id, "No updates; nothing to send");
            return Ok(DispatchOutcome::NoUpdates);
        };

        let Some(mailer) = &self.mailer else {
            warn!(
                task = %task.id,
                "{}",
                Error::ConfigurationIncomplete("no mail transport configured; digest not sent".to_string())
            );
            return Ok(DispatchOutcome::Skipped(digest));
        };

        mailer
            .send(&task.recipient, &digest.subject, &digest.html)
            .await
            .map_err(|e| Error::DeliveryFailed(format!("{}: {}", task.recipient, e)))?;

        info!(
            task = %task.id,
            recipient = %task.recipient,
            repositories = digest.repositories.len(),
            items = digest.total,
            "Digest delivered"
        );
        Ok(DispatchOutcome::Delivered(digest))
    }
}

/// Owns notification tasks and keeps their triggers armed
#[derive(Clone)]
pub struct NotificationDispatcher {
    pipeline: Arc<DigestPipeline>,
    tasks: TaskStore,
    scheduler: Scheduler,
}

impl NotificationDispatcher {
    pub fn new(pipeline: Arc<DigestPipeline>, tasks: TaskStore, scheduler: Scheduler) -> Self {
        Self {
            pipeline,
            tasks,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub async fn list(&self) -> Result<Vec<NotificationTask>> {
        Ok(self.tasks.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<NotificationTask> {
        Ok(self.tasks.get(id).await?)
    }

    /// Validate, persist and arm a new task. An immediate task runs once now.
    pub async fn create(&self, request: TaskRequest) -> Result<NotificationTask> {
        let task = NotificationTask::from_request(request, self.scheduler.window().now())?;
        self.tasks.insert(task.clone()).await?;
        self.arm(&task).await;

        info!(task = %task.id, cadence = %task.cadence, "Task created");
        Ok(task)
    }

    /// Replace a task's settings; its trigger is swapped in one step
    pub async fn update(&self, id: &str, request: TaskRequest) -> Result<NotificationTask> {
        let mut task = self.tasks.get(id).await?;
        task.apply(request)?;
        self.tasks.update(task.clone()).await?;
        self.arm(&task).await;

        info!(task = %task.id, cadence = %task.cadence, "Task updated");
        Ok(task)
    }

    pub async fn delete(&self, id: &str) -> Result<NotificationTask> {
        let task = self.tasks.remove(id).await?;
        self.scheduler.disarm(id).await;

        info!(task = %task.id, "Task deleted");
        Ok(task)
    }

    /// Run a task now, bypassing only its trigger. Waits for a scheduled
    /// run of the same task that is already in flight.
    pub async fn execute_now(&self, id: &str) -> Result<DispatchOutcome> {
        let task = self.tasks.get(id).await?;
        self.scheduler
            .run_exclusive(&task.id, self.pipeline.run(&task))
            .await
    }

    /// Arm every stored recurring task; returns how many were armed
    pub async fn arm_all(&self) -> Result<usize> {
        let mut armed = 0;
        for task in self.tasks.list().await? {
            if task.cadence.is_recurring() {
                self.arm(&task).await;
                armed += 1;
            }
        }
        info!(armed, "Stored tasks armed");
        Ok(armed)
    }

    async fn arm(&self, task: &NotificationTask) {
        let trigger = Trigger::for_task(task);
        self.scheduler.arm(&task.id, trigger, self.job(&task.id)).await;
    }

    /// Each firing re-reads the task so the latest stored settings apply
    fn job(&self, id: &str) -> Job {
        let pipeline = self.pipeline.clone();
        let tasks = self.tasks.clone();
        let id = id.to_string();

        Arc::new(move || {
            let pipeline = pipeline.clone();
            let tasks = tasks.clone();
            let id = id.clone();
            async move {
                let task = match tasks.get(&id).await {
                    Ok(task) => task,
                    Err(e) => {
                        warn!(task = %id, "Task unavailable at firing: {}", e);
                        return;
                    }
                };
                if let Err(e) = pipeline.run(&task).await {
                    error!(task = %id, "Scheduled dispatch failed: {}", e);
                }
            }
            .boxed()
        })
    }
}
