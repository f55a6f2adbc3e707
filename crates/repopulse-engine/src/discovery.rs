use crate::scheduler::Job;
use crate::Result;
use futures_util::FutureExt;
use repopulse_ai::Translator;
use repopulse_core::{RepoSummary, Settings, TimeWindow, TrackedRepository};
use repopulse_github::GitHubClient;
use repopulse_store::{TrendingCapture, TrendingStore};
use std::sync::Arc;
use tracing::{error, warn};

/// Results returned by a free-text search
pub const DEFAULT_SEARCH_LIMIT: u8 = 10;

/// Trending repositories and repository search
pub struct TrendingService {
    client: GitHubClient,
    store: TrendingStore,
    translator: Option<Translator>,
    languages: Vec<String>,
    per_language: u8,
    created_within_days: u32,
    window: TimeWindow,
}

impl TrendingService {
    pub fn new(client: GitHubClient, store: TrendingStore, window: TimeWindow) -> Self {
        Self {
            client,
            store,
            translator: None,
            languages: vec!["python".to_string(), "java".to_string()],
            per_language: 5,
            created_within_days: 7,
            window,
        }
    }

    pub fn from_settings(settings: &Settings, client: GitHubClient, window: TimeWindow) -> Self {
        let mut service = Self::new(client, TrendingStore::new(settings.trending_dir()), window);
        service.languages = settings.trending_languages.clone();
        // search pages cap at 100
        service.per_language = settings.trending_per_language.min(100) as u8;
        service.created_within_days = settings.trending_created_within_days;
        service
    }

    pub fn with_translator(mut self, translator: Option<Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// Live trending list, translated when a model is configured
    pub async fn trending(&self) -> Result<Vec<RepoSummary>> {
        let mut repos = self
            .client
            .trending(
                &self.languages,
                self.per_language,
                self.created_within_days,
                self.window.now(),
            )
            .await?;
        self.translate(&mut repos).await;
        Ok(repos)
    }

    /// Free-text search; a blank query is rejected before reaching GitHub
    pub async fn search(&self, query: &str, limit: u8) -> Result<Vec<RepoSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(repopulse_core::Error::InvalidQuery("query is empty".to_string()).into());
        }

        let mut repos = self.client.search_repositories(query, limit).await?;
        self.translate(&mut repos).await;
        Ok(repos)
    }

    /// Current details of one repository
    pub async fn repository(&self, full_name: &str) -> Result<RepoSummary> {
        let repository = TrackedRepository::parse(full_name)?;
        Ok(self.client.get_repository(&repository).await?)
    }

    /// Fetch the trending list and persist it as a timestamped capture
    pub async fn capture(&self) -> Result<TrendingCapture> {
        let repositories = self.trending().await?;
        let capture = TrendingCapture {
            captured_at: self.window.now(),
            description: format!(
                "Top {} repositories per language ({}) created in the last {} days, by stars",
                self.per_language,
                self.languages.join(", "),
                self.created_within_days
            ),
            repositories,
        };
        self.store.save(&capture).await?;
        Ok(capture)
    }

    pub async fn latest_capture(&self) -> Result<Option<TrendingCapture>> {
        Ok(self.store.latest().await?)
    }

    async fn translate(&self, repos: &mut [RepoSummary]) {
        if let Some(translator) = &self.translator {
            if let Err(e) = translator.translate_repos(repos).await {
                warn!("Repository translation failed, keeping originals: {}", e);
            }
        }
    }

    /// Scheduler job that captures trending repositories on each firing
    pub fn capture_job(self: &Arc<Self>) -> Job {
        let service = self.clone();
        Arc::new(move || {
            let service = service.clone();
            async move {
                if let Err(e) = service.capture().await {
                    error!("Trending capture failed: {}", e);
                }
            }
            .boxed()
        })
    }
}
