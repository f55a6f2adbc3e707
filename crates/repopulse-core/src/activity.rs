use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Commit,
    Issue,
    PullRequest,
    Release,
}

impl ActivityKind {
    /// Fixed rendering order used by digests and summaries
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::Commit,
        ActivityKind::Issue,
        ActivityKind::PullRequest,
        ActivityKind::Release,
    ];

    /// Plural heading, e.g. "Pull requests"
    pub fn heading(&self) -> &'static str {
        match self {
            ActivityKind::Commit => "Commits",
            ActivityKind::Issue => "Issues",
            ActivityKind::PullRequest => "Pull requests",
            ActivityKind::Release => "Releases",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityKind::Commit => write!(f, "commit"),
            ActivityKind::Issue => write!(f, "issue"),
            ActivityKind::PullRequest => write!(f, "pull_request"),
            ActivityKind::Release => write!(f, "release"),
        }
    }
}

/// Variant-specific part of an activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityDetail {
    Commit { sha: String, author: String },
    Issue { number: u64, state: String },
    PullRequest { number: u64, state: String },
    Release { tag: String },
}

/// One commit, issue, pull request or release, as fetched.
///
/// `timestamp` is the instant the item counts as "updated": commit author
/// date, issue/PR `updated_at`, release publication time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
    pub url: String,
    #[serde(flatten)]
    pub detail: ActivityDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_zh: Option<String>,
}

impl ActivityItem {
    pub fn new(
        title: String,
        timestamp: DateTime<FixedOffset>,
        url: String,
        detail: ActivityDetail,
    ) -> Self {
        Self {
            title,
            description: None,
            timestamp,
            url,
            detail,
            title_zh: None,
            description_zh: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn kind(&self) -> ActivityKind {
        match self.detail {
            ActivityDetail::Commit { .. } => ActivityKind::Commit,
            ActivityDetail::Issue { .. } => ActivityKind::Issue,
            ActivityDetail::PullRequest { .. } => ActivityKind::PullRequest,
            ActivityDetail::Release { .. } => ActivityKind::Release,
        }
    }

    /// Commit author, issue/PR state, or release tag
    pub fn state_or_author(&self) -> &str {
        match &self.detail {
            ActivityDetail::Commit { author, .. } => author,
            ActivityDetail::Issue { state, .. } | ActivityDetail::PullRequest { state, .. } => state,
            ActivityDetail::Release { tag } => tag,
        }
    }

    /// First line of the title; commit messages are often multi-line
    pub fn headline(&self) -> &str {
        self.title.lines().next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub commits: usize,
    pub issues: usize,
    pub pull_requests: usize,
    pub releases: usize,
}

impl ActivityCounts {
    pub fn from_items(items: &[ActivityItem]) -> Self {
        items.iter().fold(Self::default(), |mut counts, item| {
            match item.kind() {
                ActivityKind::Commit => counts.commits += 1,
                ActivityKind::Issue => counts.issues += 1,
                ActivityKind::PullRequest => counts.pull_requests += 1,
                ActivityKind::Release => counts.releases += 1,
            }
            counts
        })
    }

    pub fn get(&self, kind: ActivityKind) -> usize {
        match kind {
            ActivityKind::Commit => self.commits,
            ActivityKind::Issue => self.issues,
            ActivityKind::PullRequest => self.pull_requests,
            ActivityKind::Release => self.releases,
        }
    }

    pub fn total(&self) -> usize {
        self.commits + self.issues + self.pull_requests + self.releases
    }
}

/// A full point-in-time capture of one repository's recent activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub repository: String,
    pub captured_at: DateTime<FixedOffset>,
    pub items: Vec<ActivityItem>,
    pub counts: ActivityCounts,
}

impl ActivitySnapshot {
    pub fn new(
        repository: String,
        captured_at: DateTime<FixedOffset>,
        items: Vec<ActivityItem>,
    ) -> Self {
        let counts = ActivityCounts::from_items(&items);
        Self {
            repository,
            captured_at,
            items,
            counts,
        }
    }

    pub fn items_of(&self, kind: ActivityKind) -> impl Iterator<Item = &ActivityItem> {
        self.items.iter().filter(move |item| item.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn commit(message: &str) -> ActivityItem {
        ActivityItem::new(
            message.to_string(),
            at("2026-10-18T09:00:00+08:00"),
            "https://github.com/octocat/Hello-World/commit/abc".to_string(),
            ActivityDetail::Commit {
                sha: "abc".to_string(),
                author: "octocat".to_string(),
            },
        )
    }

    #[test]
    fn test_kind_and_state_or_author() {
        let item = commit("Fix bug\n\nLong body");
        assert_eq!(item.kind(), ActivityKind::Commit);
        assert_eq!(item.state_or_author(), "octocat");
        assert_eq!(item.headline(), "Fix bug");

        let release = ActivityItem::new(
            "v1.0".to_string(),
            at("2026-10-18T09:00:00+08:00"),
            "https://example.com".to_string(),
            ActivityDetail::Release {
                tag: "v1.0.0".to_string(),
            },
        );
        assert_eq!(release.state_or_author(), "v1.0.0");
    }

    #[test]
    fn test_snapshot_counts() {
        let issue = ActivityItem::new(
            "Crash on start".to_string(),
            at("2026-10-18T10:00:00+08:00"),
            "https://github.com/octocat/Hello-World/issues/1".to_string(),
            ActivityDetail::Issue {
                number: 1,
                state: "open".to_string(),
            },
        );
        let snapshot = ActivitySnapshot::new(
            "octocat/Hello-World".to_string(),
            at("2026-10-19T08:00:00+08:00"),
            vec![commit("a"), commit("b"), issue],
        );

        assert_eq!(snapshot.counts.commits, 2);
        assert_eq!(snapshot.counts.issues, 1);
        assert_eq!(snapshot.counts.total(), 3);
        assert_eq!(snapshot.items_of(ActivityKind::Commit).count(), 2);
    }

    #[test]
    fn test_item_json_shape() {
        let json = serde_json::to_value(commit("a")).unwrap();
        assert_eq!(json["kind"], "commit");
        assert_eq!(json["author"], "octocat");
        assert!(json.get("title_zh").is_none());
    }

    #[test]
    fn test_blank_description_dropped() {
        let item = commit("a").with_description(Some("   ".to_string()));
        assert!(item.description.is_none());
    }
}
