use crate::discovery::TrendingService;
use crate::dispatcher::{DigestPipeline, NotificationDispatcher};
use crate::mailer::{Mailer, SmtpMailer};
use crate::scheduler::{Scheduler, Trigger};
use crate::tracker::ActivityTracker;
use crate::Result;
use chrono::NaiveTime;
use repopulse_ai::{build_model, SummaryService, Translator};
use repopulse_core::{Settings, TimeWindow};
use repopulse_github::{ActivityCollector, GitHubActivitySource, GitHubClient, RestClient};
use repopulse_store::{SnapshotStore, TaskStore, TrackedRepoList};
use std::sync::Arc;
use tracing::{info, warn};

/// Daily trending capture times in the reference zone
const TRENDING_CAPTURE_TIMES: [(&str, u32); 2] = [("trending-morning", 8), ("trending-evening", 20)];

/// Everything an entry point needs, wired from settings
#[derive(Clone)]
pub struct Services {
    pub settings: Arc<Settings>,
    pub window: TimeWindow,
    pub tracker: Arc<ActivityTracker>,
    pub trending: Arc<TrendingService>,
    pub dispatcher: NotificationDispatcher,
    pub summary: Option<SummaryService>,
}

impl Services {
    /// Wire all services around an entry-point-owned scheduler.
    ///
    /// Missing mail or model credentials disable those features with a
    /// warning; they never fail startup.
    pub fn from_settings(settings: Settings, scheduler: Scheduler) -> Result<Self> {
        let window = scheduler.window();
        let token = settings.github_token().map(str::to_string);
        if token.is_none() {
            warn!("GITHUB_TOKEN not set; using anonymous GitHub access");
        }

        let rest = RestClient::with_base_url(&settings.github_api_url, token.clone(), settings.http_timeout())?;
        let source = Arc::new(GitHubActivitySource::new(rest, window));
        let collector = ActivityCollector::new(source, window);
        let client = GitHubClient::new(token, settings.http_timeout())?;

        let model = match build_model(&settings) {
            Ok(model) => model,
            Err(e) => {
                warn!("Language model disabled: {}", e);
                None
            }
        };
        if let Some(model) = &model {
            info!(provider = %model.provider(), "Language model enabled");
        }
        let translator = model
            .clone()
            .map(|m| Translator::new(m, &settings.translate_to));
        let summary = model.map(|m| SummaryService::new(m, &settings.translate_to));

        let mailer: Option<Arc<dyn Mailer>> = match SmtpMailer::from_settings(&settings) {
            Ok(mailer) => Some(Arc::new(mailer)),
            Err(e) => {
                warn!("Mail delivery disabled: {}", e);
                None
            }
        };

        let tracker = Arc::new(
            ActivityTracker::new(
                collector,
                SnapshotStore::new(settings.snapshot_dir(), window),
                TrackedRepoList::new(settings.tracked_repos_file()),
            )
            .with_translator(translator.clone()),
        );

        let trending = Arc::new(
            TrendingService::from_settings(&settings, client, window).with_translator(translator),
        );

        let digest_summary = summary.clone().filter(|_| settings.digest_summary);
        let pipeline = Arc::new(
            DigestPipeline::new(tracker.clone(), mailer, settings.lookback_days)
                .with_summary(digest_summary),
        );
        let dispatcher = NotificationDispatcher::new(pipeline, TaskStore::new(settings.tasks_file()), scheduler);

        Ok(Self {
            settings: Arc::new(settings),
            window,
            tracker,
            trending,
            dispatcher,
            summary,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        self.dispatcher.scheduler()
    }

    /// Capture trending repositories now and then twice a day
    pub async fn start_trending_capture(&self) {
        let job = self.trending.capture_job();
        for (id, hour) in TRENDING_CAPTURE_TIMES {
            if let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) {
                self.scheduler().arm(id, Trigger::Daily(time), job.clone()).await;
            }
        }
        self.scheduler().arm("trending-startup", Trigger::Once, job).await;
    }
}
