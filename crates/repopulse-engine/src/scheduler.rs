use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Weekday};
use futures_util::future::BoxFuture;
use repopulse_core::{Cadence, NotificationTask, TimeWindow};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Work run on each firing
pub type Job = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// When a registration fires, in the reference zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Once, right away
    Once,
    Daily(NaiveTime),
    Weekly(Weekday, NaiveTime),
    /// Day of month, clamped to the month's last day
    Monthly(u32, NaiveTime),
}

impl Trigger {
    pub fn for_task(task: &NotificationTask) -> Self {
        match task.cadence {
            Cadence::Immediate => Trigger::Once,
            Cadence::Daily => Trigger::Daily(task.time_of_day),
            Cadence::Weekly(day) => Trigger::Weekly(day, task.time_of_day),
            Cadence::Monthly(day) => Trigger::Monthly(day, task.time_of_day),
        }
    }

    /// First due time strictly after `now`; `None` for [`Trigger::Once`]
    pub fn next_after(&self, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let zone = *now.offset();
        let today = now.date_naive();

        match *self {
            Trigger::Once => None,
            Trigger::Daily(time) => {
                let candidate = at(zone, today, time)?;
                if candidate > now {
                    Some(candidate)
                } else {
                    at(zone, today.succ_opt()?, time)
                }
            }
            Trigger::Weekly(day, time) => {
                let ahead = (7 + day.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
                let candidate = at(zone, today + Duration::days(i64::from(ahead)), time)?;
                if candidate > now {
                    Some(candidate)
                } else {
                    Some(candidate + Duration::days(7))
                }
            }
            Trigger::Monthly(day, time) => {
                let candidate = at(zone, clamp_day(today.year(), today.month(), day)?, time)?;
                if candidate > now {
                    return Some(candidate);
                }
                let (year, month) = if today.month() == 12 {
                    (today.year() + 1, 1)
                } else {
                    (today.year(), today.month() + 1)
                };
                at(zone, clamp_day(year, month, day)?, time)
            }
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Once => write!(f, "once"),
            Trigger::Daily(time) => write!(f, "daily at {}", time.format("%H:%M")),
            Trigger::Weekly(day, time) => write!(f, "every {} at {}", day, time.format("%H:%M")),
            Trigger::Monthly(day, time) => write!(f, "monthly on day {} at {}", day, time.format("%H:%M")),
        }
    }
}

fn at(zone: FixedOffset, date: NaiveDate, time: NaiveTime) -> Option<DateTime<FixedOffset>> {
    zone.from_local_datetime(&date.and_time(time)).single()
}

fn clamp_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next.pred_opt()?.day();
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

struct Registration {
    generation: u64,
    trigger: Trigger,
    stop: Arc<Notify>,
    handle: JoinHandle<()>,
}

/// Process-wide trigger registry.
///
/// Each id owns at most one registration; arming an id again replaces the
/// previous registration in one step. Every run of an id, scheduled or
/// manual, holds that id's gate until the job completes, so runs of one id
/// never overlap, even across re-arms. Created by the entry point and handed
/// to whoever arms triggers.
#[derive(Clone)]
pub struct Scheduler {
    registrations: Arc<Mutex<HashMap<String, Registration>>>,
    gates: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    generations: Arc<AtomicU64>,
    window: TimeWindow,
}

impl Scheduler {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            registrations: Arc::new(Mutex::new(HashMap::new())),
            gates: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
            window,
        }
    }

    /// Run `work` while holding the gate for `id`.
    ///
    /// Waits for any scheduled or manual run of the same id to finish first.
    pub async fn run_exclusive<F>(&self, id: &str, work: F) -> F::Output
    where
        F: Future,
    {
        let gate = self.gate(id).await;
        let _running = gate.lock().await;
        work.await
    }

    /// Gates outlive registrations so a replaced loop and its successor share one
    async fn gate(&self, id: &str) -> Arc<Mutex<()>> {
        self.gates
            .lock()
            .await
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Register `job` under `id`, replacing any earlier registration for it
    pub async fn arm(&self, id: &str, trigger: Trigger, job: Job) {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let stop = Arc::new(Notify::new());

        let mut registrations = self.registrations.lock().await;
        if let Some(previous) = registrations.remove(id) {
            debug!(id, trigger = %previous.trigger, "Replacing trigger");
            stop_registration(previous);
        }

        let handle = tokio::spawn(run_trigger(
            self.clone(),
            id.to_string(),
            generation,
            trigger,
            job,
            stop.clone(),
        ));
        registrations.insert(
            id.to_string(),
            Registration {
                generation,
                trigger,
                stop,
                handle,
            },
        );

        info!(id, %trigger, "Trigger armed");
    }

    /// Remove the registration for `id`; `false` if none existed
    pub async fn disarm(&self, id: &str) -> bool {
        match self.registrations.lock().await.remove(id) {
            Some(registration) => {
                stop_registration(registration);
                info!(id, "Trigger disarmed");
                true
            }
            None => false,
        }
    }

    /// Currently armed ids and their triggers, sorted by id
    pub async fn registered(&self) -> Vec<(String, Trigger)> {
        let mut armed: Vec<(String, Trigger)> = self
            .registrations
            .lock()
            .await
            .iter()
            .map(|(id, r)| (id.clone(), r.trigger))
            .collect();
        armed.sort_by(|a, b| a.0.cmp(&b.0));
        armed
    }

    pub async fn next_run(&self, id: &str) -> Option<DateTime<FixedOffset>> {
        let trigger = self.registrations.lock().await.get(id)?.trigger;
        trigger.next_after(self.window.now())
    }

    /// Stop every registration and wait for in-flight jobs to finish
    pub async fn shutdown(&self) {
        let drained: Vec<(String, Registration)> =
            self.registrations.lock().await.drain().collect();
        info!("Scheduler shutting down ({} triggers)", drained.len());

        for (id, registration) in drained {
            registration.stop.notify_one();
            if let Err(e) = registration.handle.await {
                if !e.is_cancelled() {
                    warn!(id = %id, "Trigger task ended abnormally: {}", e);
                }
            }
        }
    }

    async fn deregister_if_current(&self, id: &str, generation: u64) {
        let mut registrations = self.registrations.lock().await;
        if registrations.get(id).map(|r| r.generation) == Some(generation) {
            registrations.remove(id);
            debug!(id, "One-shot trigger deregistered");
        }
    }
}

/// Signal the loop to stop; a job already running finishes under its gate
fn stop_registration(registration: Registration) {
    registration.stop.notify_one();
}

async fn run_trigger(
    scheduler: Scheduler,
    id: String,
    generation: u64,
    trigger: Trigger,
    job: Job,
    stop: Arc<Notify>,
) {
    if trigger == Trigger::Once {
        scheduler.run_exclusive(&id, job()).await;
        scheduler.deregister_if_current(&id, generation).await;
        return;
    }

    loop {
        let now = scheduler.window.now();
        let Some(due) = trigger.next_after(now) else {
            warn!(id = %id, %trigger, "No next due time; trigger stopped");
            return;
        };
        let wait = (due - now).to_std().unwrap_or_default();
        debug!(id = %id, due = %due, "Waiting for next firing");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = stop.notified() => {
                debug!(id = %id, "Trigger stopped");
                return;
            }
        }

        info!(id = %id, %trigger, "Trigger fired");
        scheduler.run_exclusive(&id, job()).await;
    }
}
