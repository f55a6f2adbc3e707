use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime};
use repopulse_core::{
    ActivityDetail, ActivityItem, ActivityKind, TaskRequest, TimeWindow, TrackedRepository,
};
use repopulse_engine::{
    ActivityTracker, DigestPipeline, DispatchOutcome, Error, Mailer, NotificationDispatcher,
    Scheduler, Trigger,
};
use repopulse_github::{ActivityCollector, ActivitySource};
use repopulse_store::{SnapshotStore, TaskStore, TrackedRepoList};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Serves fixed activity per repository; unknown repositories fail
struct MockSource {
    base: DateTime<FixedOffset>,
    activity: HashMap<String, Vec<(ActivityKind, i64)>>,
}

impl MockSource {
    fn item(&self, repository: &str, kind: ActivityKind, minutes_ago: i64) -> ActivityItem {
        let timestamp = self.base - Duration::minutes(minutes_ago);
        let detail = match kind {
            ActivityKind::Commit => ActivityDetail::Commit {
                sha: format!("{:x}", minutes_ago),
                author: "octocat".to_string(),
            },
            ActivityKind::Issue => ActivityDetail::Issue {
                number: minutes_ago as u64,
                state: "open".to_string(),
            },
            ActivityKind::PullRequest => ActivityDetail::PullRequest {
                number: minutes_ago as u64,
                state: "merged".to_string(),
            },
            ActivityKind::Release => ActivityDetail::Release {
                tag: format!("v{}", minutes_ago),
            },
        };
        ActivityItem::new(
            format!("{} {} {}", repository, kind, minutes_ago),
            timestamp,
            format!("https://github.com/{}", repository),
            detail,
        )
    }
}

#[async_trait]
impl ActivitySource for MockSource {
    async fn fetch(
        &self,
        repository: &TrackedRepository,
        kind: ActivityKind,
        _cutoff: DateTime<FixedOffset>,
    ) -> repopulse_github::Result<Vec<ActivityItem>> {
        let Some(activity) = self.activity.get(&repository.full_name) else {
            return Err(repopulse_github::Error::RepoNotFound(repository.full_name.clone()));
        };
        Ok(activity
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(k, minutes)| self.item(&repository.full_name, *k, *minutes))
            .collect())
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: bool,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> repopulse_engine::Result<()> {
        if self.fail {
            return Err(Error::Other(anyhow::anyhow!("connection refused")));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html_body.to_string()));
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    dispatcher: NotificationDispatcher,
    scheduler: Scheduler,
}

fn fixture(mailer: Option<Arc<RecordingMailer>>) -> Fixture {
    let dir = TempDir::new().unwrap();
    let window = TimeWindow::default();

    let mut activity = HashMap::new();
    activity.insert(
        "octocat/Hello-World".to_string(),
        vec![
            (ActivityKind::Commit, 30),
            (ActivityKind::Commit, 90),
            (ActivityKind::Issue, 45),
            (ActivityKind::Release, 60 * 24 * 20),
        ],
    );
    activity.insert("octocat/Spoon-Knife".to_string(), Vec::new());
    let source = Arc::new(MockSource {
        base: window.now(),
        activity,
    });

    let tracker = Arc::new(ActivityTracker::new(
        ActivityCollector::new(source, window),
        SnapshotStore::new(dir.path().join("snapshots"), window),
        TrackedRepoList::new(dir.path().join("tracked.json")),
    ));
    let mailer = mailer.map(|m| m as Arc<dyn Mailer>);
    let pipeline = Arc::new(DigestPipeline::new(tracker, mailer, 7));

    let scheduler = Scheduler::new(window);
    let dispatcher = NotificationDispatcher::new(
        pipeline,
        TaskStore::new(dir.path().join("tasks.json")),
        scheduler.clone(),
    );

    Fixture {
        _dir: dir,
        dispatcher,
        scheduler,
    }
}

fn request(repositories: &[&str], frequency: &str, weekday: Option<&str>) -> TaskRequest {
    TaskRequest {
        email: "dev@example.com".to_string(),
        repositories: repositories.iter().map(|r| r.to_string()).collect(),
        frequency: frequency.to_string(),
        weekday: weekday.map(str::to_string),
        month_day: None,
        execute_time: Some("09:00".to_string()),
    }
}

#[tokio::test]
async fn test_execute_now_twice_renders_identical_digests() {
    let mailer = Arc::new(RecordingMailer::default());
    let fx = fixture(Some(mailer.clone()));
    let task = fx
        .dispatcher
        .create(request(&["octocat/Hello-World", "octocat/Spoon-Knife"], "daily", None))
        .await
        .unwrap();

    let first = fx.dispatcher.execute_now(&task.id).await.unwrap();
    let second = fx.dispatcher.execute_now(&task.id).await.unwrap();
    assert_eq!(first, second);

    let DispatchOutcome::Delivered(digest) = first else {
        panic!("expected a delivery, got {:?}", first);
    };
    assert_eq!(digest.repositories, vec!["octocat/Hello-World".to_string()]);
    assert_eq!(digest.total, 3);
    assert_eq!(digest.html.matches("<h3>").count(), 1);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(sent[0].0, "dev@example.com");
}

#[tokio::test]
async fn test_no_updates_sends_nothing() {
    let mailer = Arc::new(RecordingMailer::default());
    let fx = fixture(Some(mailer.clone()));
    let task = fx
        .dispatcher
        .create(request(&["octocat/Spoon-Knife"], "daily", None))
        .await
        .unwrap();

    let outcome = fx.dispatcher.execute_now(&task.id).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::NoUpdates);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_failed_repository_is_skipped() {
    let mailer = Arc::new(RecordingMailer::default());
    let fx = fixture(Some(mailer.clone()));
    let task = fx
        .dispatcher
        .create(request(&["missing/repo", "octocat/Hello-World"], "daily", None))
        .await
        .unwrap();

    let outcome = fx.dispatcher.execute_now(&task.id).await.unwrap();
    match outcome {
        DispatchOutcome::Delivered(digest) => {
            assert_eq!(digest.repositories, vec!["octocat/Hello-World".to_string()]);
        }
        other => panic!("expected a delivery, got {:?}", other),
    }
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_weekly_task_switched_to_daily_has_one_registration() {
    let fx = fixture(None);
    let task = fx
        .dispatcher
        .create(request(&["octocat/Hello-World"], "weekly", Some("3")))
        .await
        .unwrap();

    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    assert_eq!(
        fx.scheduler.registered().await,
        vec![(task.id.clone(), Trigger::Weekly(chrono::Weekday::Wed, nine))]
    );

    fx.dispatcher
        .update(&task.id, request(&["octocat/Hello-World"], "daily", None))
        .await
        .unwrap();
    assert_eq!(
        fx.scheduler.registered().await,
        vec![(task.id.clone(), Trigger::Daily(nine))]
    );

    fx.dispatcher.delete(&task.id).await.unwrap();
    assert!(fx.scheduler.registered().await.is_empty());
    assert!(fx.dispatcher.execute_now(&task.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_without_mailer_digest_is_skipped() {
    let fx = fixture(None);
    let task = fx
        .dispatcher
        .create(request(&["octocat/Hello-World"], "daily", None))
        .await
        .unwrap();

    let outcome = fx.dispatcher.execute_now(&task.id).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Skipped(_)));
}

#[tokio::test]
async fn test_delivery_failure_propagates() {
    let mailer = Arc::new(RecordingMailer {
        fail: true,
        ..RecordingMailer::default()
    });
    let fx = fixture(Some(mailer));
    let task = fx
        .dispatcher
        .create(request(&["octocat/Hello-World"], "daily", None))
        .await
        .unwrap();

    let err = fx.dispatcher.execute_now(&task.id).await.unwrap_err();
    assert!(matches!(err, Error::DeliveryFailed(_)));
}

#[tokio::test]
async fn test_arm_all_skips_immediate_tasks() {
    let fx = fixture(None);
    fx.dispatcher
        .create(request(&["octocat/Hello-World"], "immediate", None))
        .await
        .unwrap();
    let daily = fx
        .dispatcher
        .create(request(&["octocat/Hello-World"], "daily", None))
        .await
        .unwrap();

    fx.scheduler.shutdown().await;
    assert_eq!(fx.dispatcher.arm_all().await.unwrap(), 1);
    assert_eq!(fx.scheduler.registered().await.len(), 1);
    assert_eq!(fx.scheduler.registered().await[0].0, daily.id);
}

#[tokio::test]
async fn test_invalid_request_rejected() {
    let fx = fixture(None);
    let mut bad = request(&["octocat/Hello-World"], "daily", None);
    bad.email = "not-an-email".to_string();
    let err = fx.dispatcher.create(bad).await.unwrap_err();
    assert!(err.is_invalid_input());
    assert!(fx.dispatcher.list().await.unwrap().is_empty());
}
