use crate::{RestClient, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use repopulse_core::{ActivityDetail, ActivityItem, ActivityKind, TimeWindow, TrackedRepository};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const PER_PAGE: usize = 100;
const MAX_PAGES: u32 = 10;

/// Where activity items come from
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Items of `kind` updated or created after `cutoff`
    async fn fetch(
        &self,
        repository: &TrackedRepository,
        kind: ActivityKind,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<ActivityItem>>;
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    sha: String,
    html_url: String,
    commit: CommitBody,
    #[serde(default)]
    author: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    message: String,
    author: Option<GitSignature>,
    committer: Option<GitSignature>,
}

#[derive(Debug, Deserialize)]
struct GitSignature {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    html_url: String,
    updated_at: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PullPayload {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    html_url: String,
    updated_at: String,
    #[serde(default)]
    merged_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    draft: bool,
}

/// GitHub REST implementation of [`ActivitySource`]
#[derive(Clone)]
pub struct GitHubActivitySource {
    rest: RestClient,
    window: TimeWindow,
}

impl GitHubActivitySource {
    pub fn new(rest: RestClient, window: TimeWindow) -> Self {
        Self { rest, window }
    }

    async fn commits(
        &self,
        repo: &TrackedRepository,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<ActivityItem>> {
        let path = format!("/repos/{}/commits", repo.full_name);
        let since = api_time(cutoff);
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let values = self
                .rest
                .get_list(&path, &[("since", since.clone()), per_page(), ("page", page.to_string())])
                .await?;
            let last_page = values.len() < PER_PAGE;

            for payload in self.decode::<CommitPayload>(repo, values) {
                let Some(stamp) = self.stamp(
                    repo,
                    payload
                        .commit
                        .author
                        .as_ref()
                        .or(payload.commit.committer.as_ref())
                        .and_then(|sig| sig.date.as_deref()),
                ) else {
                    continue;
                };

                let author = payload
                    .author
                    .map(|user| user.login)
                    .or_else(|| payload.commit.author.and_then(|sig| sig.name))
                    .unwrap_or_else(|| "unknown".to_string());

                items.push(ActivityItem::new(
                    payload.commit.message,
                    stamp,
                    payload.html_url,
                    ActivityDetail::Commit {
                        sha: payload.sha,
                        author,
                    },
                ));
            }

            if last_page {
                break;
            }
        }

        Ok(items)
    }

    async fn issues(
        &self,
        repo: &TrackedRepository,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<ActivityItem>> {
        let path = format!("/repos/{}/issues", repo.full_name);
        let since = api_time(cutoff);
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let values = self
                .rest
                .get_list(
                    &path,
                    &[
                        ("state", "all".to_string()),
                        ("since", since.clone()),
                        per_page(),
                        ("page", page.to_string()),
                    ],
                )
                .await?;
            let last_page = values.len() < PER_PAGE;

            // The issues endpoint also lists pull requests; those come from the pulls stream
            for payload in self
                .decode::<IssuePayload>(repo, values)
                .into_iter()
                .filter(|issue| issue.pull_request.is_none())
            {
                let Some(stamp) = self.stamp(repo, Some(payload.updated_at.as_str())) else {
                    continue;
                };
                items.push(
                    ActivityItem::new(
                        payload.title,
                        stamp,
                        payload.html_url,
                        ActivityDetail::Issue {
                            number: payload.number,
                            state: payload.state,
                        },
                    )
                    .with_description(payload.body),
                );
            }

            if last_page {
                break;
            }
        }

        Ok(items)
    }

    async fn pulls(
        &self,
        repo: &TrackedRepository,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<ActivityItem>> {
        let path = format!("/repos/{}/pulls", repo.full_name);
        let mut items = Vec::new();

        'pages: for page in 1..=MAX_PAGES {
            let values = self
                .rest
                .get_list(
                    &path,
                    &[
                        ("state", "all".to_string()),
                        ("sort", "updated".to_string()),
                        ("direction", "desc".to_string()),
                        per_page(),
                        ("page", page.to_string()),
                    ],
                )
                .await?;
            let last_page = values.len() < PER_PAGE;

            for payload in self.decode::<PullPayload>(repo, values) {
                let Some(stamp) = self.stamp(repo, Some(payload.updated_at.as_str())) else {
                    continue;
                };
                // Sorted by update time, newest first: nothing further can be recent
                if stamp <= cutoff {
                    break 'pages;
                }

                let state = if payload.merged_at.is_some() {
                    "merged".to_string()
                } else {
                    payload.state
                };
                items.push(
                    ActivityItem::new(
                        payload.title,
                        stamp,
                        payload.html_url,
                        ActivityDetail::PullRequest {
                            number: payload.number,
                            state,
                        },
                    )
                    .with_description(payload.body),
                );
            }

            if last_page {
                break;
            }
        }

        Ok(items)
    }

    async fn releases(
        &self,
        repo: &TrackedRepository,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<ActivityItem>> {
        let path = format!("/repos/{}/releases", repo.full_name);
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let values = self
                .rest
                .get_list(&path, &[per_page(), ("page", page.to_string())])
                .await?;
            let last_page = values.len() < PER_PAGE;
            let mut any_recent = false;

            for payload in self.decode::<ReleasePayload>(repo, values) {
                if payload.draft {
                    continue;
                }
                let Some(stamp) = self.stamp(repo, payload.published_at.as_deref()) else {
                    continue;
                };
                if stamp <= cutoff {
                    continue;
                }
                any_recent = true;

                let title = payload
                    .name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| payload.tag_name.clone());
                items.push(
                    ActivityItem::new(
                        title,
                        stamp,
                        payload.html_url,
                        ActivityDetail::Release {
                            tag: payload.tag_name,
                        },
                    )
                    .with_description(payload.body),
                );
            }

            if last_page || !any_recent {
                break;
            }
        }

        Ok(items)
    }

    /// Decode each element on its own so one odd record does not sink the page
    fn decode<T: DeserializeOwned>(
        &self,
        repo: &TrackedRepository,
        values: Vec<serde_json::Value>,
    ) -> Vec<T> {
        values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<T>(value) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    tracing::warn!(repository = %repo, "Skipping undecodable item: {}", e);
                    None
                }
            })
            .collect()
    }

    fn stamp(&self, repo: &TrackedRepository, raw: Option<&str>) -> Option<DateTime<FixedOffset>> {
        let Some(raw) = raw else {
            tracing::warn!(repository = %repo, "Skipping item without timestamp");
            return None;
        };
        match self.window.parse(raw) {
            Ok(stamp) => Some(stamp),
            Err(e) => {
                tracing::warn!(repository = %repo, "Skipping item: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ActivitySource for GitHubActivitySource {
    async fn fetch(
        &self,
        repository: &TrackedRepository,
        kind: ActivityKind,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<ActivityItem>> {
        match kind {
            ActivityKind::Commit => self.commits(repository, cutoff).await,
            ActivityKind::Issue => self.issues(repository, cutoff).await,
            ActivityKind::PullRequest => self.pulls(repository, cutoff).await,
            ActivityKind::Release => self.releases(repository, cutoff).await,
        }
    }
}

fn per_page() -> (&'static str, String) {
    ("per_page", PER_PAGE.to_string())
}

/// ISO-8601 in UTC, as the `since` parameters expect
fn api_time(instant: DateTime<FixedOffset>) -> String {
    instant
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
