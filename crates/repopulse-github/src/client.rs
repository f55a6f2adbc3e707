use crate::{Error, Result};
use chrono::{DateTime, Duration, FixedOffset};
use octocrab::Octocrab;
use repopulse_core::{RepoSummary, TrackedRepository};
use std::time::Duration as StdDuration;

/// Repository search and lookup over octocrab
#[derive(Clone)]
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Anonymous access when `token` is `None`, at a much lower rate limit.
    /// `timeout` bounds both connecting and reading.
    pub fn new(token: Option<String>, timeout: StdDuration) -> Result<Self> {
        let builder = Octocrab::builder()
            .set_connect_timeout(Some(timeout))
            .set_read_timeout(Some(timeout));
        let client = match token {
            Some(token) => builder.personal_token(token).build()?,
            None => builder.build()?,
        };

        Ok(Self { client })
    }

    /// Free-text repository search, best match first
    pub async fn search_repositories(&self, query: &str, limit: u8) -> Result<Vec<RepoSummary>> {
        tracing::info!("Searching repositories: {}", query);

        let page = self
            .client
            .search()
            .repositories(query)
            .per_page(limit)
            .send()
            .await
            .map_err(|e| classify(e, query))?;

        Ok(page
            .items
            .into_iter()
            .take(usize::from(limit))
            .filter_map(summarize)
            .collect())
    }

    /// Top `per_language` repositories by stars for each language, created
    /// within the last `created_within_days` days
    pub async fn trending(
        &self,
        languages: &[String],
        per_language: u8,
        created_within_days: u32,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<RepoSummary>> {
        let mut repos = Vec::new();

        for language in languages {
            let query = trending_query(language, created_within_days, now);
            tracing::info!("Fetching trending repositories: {}", query);

            let page = self
                .client
                .search()
                .repositories(&query)
                .sort("stars")
                .order("desc")
                .per_page(per_language)
                .send()
                .await
                .map_err(|e| classify(e, &query))?;

            repos.extend(
                page.items
                    .into_iter()
                    .take(usize::from(per_language))
                    .filter_map(summarize),
            );
        }

        Ok(repos)
    }

    pub async fn get_repository(&self, repository: &TrackedRepository) -> Result<RepoSummary> {
        let repo = self
            .client
            .repos(repository.owner(), repository.name())
            .get()
            .await
            .map_err(|e| classify(e, &repository.full_name))?;

        summarize(repo).ok_or_else(|| Error::RepoNotFound(repository.full_name.clone()))
    }
}

/// Map a GitHub error reply onto a typed error by its status code
fn classify(error: octocrab::Error, target: &str) -> Error {
    match error {
        octocrab::Error::GitHub { source, .. } => from_status(source.status_code.as_u16(), target, &source.message),
        other => Error::Octocrab(other),
    }
}

fn from_status(status: u16, target: &str, message: &str) -> Error {
    match status {
        404 => Error::RepoNotFound(target.to_string()),
        401 => Error::AuthError(message.to_string()),
        429 => Error::RateLimited(message.to_string()),
        403 if message.to_lowercase().contains("rate limit") => Error::RateLimited(message.to_string()),
        403 => Error::AuthError(format!("Forbidden: {}", message)),
        _ => Error::ApiError(format!("{} ({}): {}", target, status, message)),
    }
}

/// `language:<l> created:><date>` with the date `created_within_days` before `now`
pub fn trending_query(language: &str, created_within_days: u32, now: DateTime<FixedOffset>) -> String {
    let since = (now - Duration::days(i64::from(created_within_days))).date_naive();
    format!("language:{} created:>{}", language, since.format("%Y-%m-%d"))
}

fn summarize(repo: octocrab::models::Repository) -> Option<RepoSummary> {
    let full_name = repo.full_name?;
    let url = repo
        .html_url
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("https://github.com/{}", full_name));

    let mut summary = RepoSummary::new(full_name, url);
    summary.description = repo.description;
    summary.stars = repo.stargazers_count.unwrap_or_default();
    summary.language = repo
        .language
        .and_then(|value| value.as_str().map(str::to_string));
    Some(summary)
}
