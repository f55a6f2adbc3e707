use repopulse_ai::SummaryService;
use repopulse_core::{validate_days, Settings};
use repopulse_engine::{ActivityTracker, NotificationDispatcher, Services, TrendingService};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub settings: Arc<Settings>,
    pub tracker: Arc<ActivityTracker>,
    pub trending: Arc<TrendingService>,
    pub dispatcher: NotificationDispatcher,
    pub summary: Option<SummaryService>,
}

impl ApiState {
    pub fn new(services: &Services) -> Self {
        Self {
            settings: services.settings.clone(),
            tracker: services.tracker.clone(),
            trending: services.trending.clone(),
            dispatcher: services.dispatcher.clone(),
            summary: services.summary.clone(),
        }
    }

    /// Requested lookback, or the configured default
    pub fn lookback(&self, days: Option<i64>) -> repopulse_core::Result<u32> {
        match days {
            Some(days) => validate_days(days),
            None => Ok(self.settings.lookback_days),
        }
    }
}
