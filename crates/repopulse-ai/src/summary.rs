use crate::{model::LanguageModel, translate::language_name, Result};
use repopulse_core::{RepoSummary, UpdateReport};
use std::fmt::Write;
use std::sync::Arc;

/// Activities per repository included in a tracked-repositories prompt
const ACTIVITIES_PER_REPO: usize = 5;

/// Natural-language reports over repository data
#[derive(Clone)]
pub struct SummaryService {
    model: Arc<dyn LanguageModel>,
    language: String,
}

impl SummaryService {
    pub fn new(model: Arc<dyn LanguageModel>, language: &str) -> Self {
        Self {
            model,
            language: language.to_string(),
        }
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        let prompt = format!(
            "Summarize the following text in {} in a few short paragraphs:\n\n{}",
            language_name(&self.language),
            text
        );
        self.model.complete(&prompt).await
    }

    /// Overview of trending repositories: domains, standouts, trends
    pub async fn hot_repos_summary(&self, repos: &[RepoSummary]) -> Result<String> {
        let mut listing = String::new();
        for repo in repos {
            let _ = writeln!(listing, "Project: {}", repo.full_name);
            let _ = writeln!(
                listing,
                "Description: {}",
                repo.description.as_deref().unwrap_or("(none)")
            );
            let _ = writeln!(
                listing,
                "Stars: {}, Language: {}\n",
                repo.stars,
                repo.language.as_deref().unwrap_or("unknown")
            );
        }

        let prompt = format!(
            r#"Analyze the following list of trending GitHub projects and write a concise report covering:
1. The main project types and domains
2. The most notable projects and what sets them apart
3. Current technology trends

Projects:
{}
Write the report in {}."#,
            listing,
            language_name(&self.language)
        );
        self.model.complete(&prompt).await
    }

    /// Report on recent activity of tracked repositories
    pub async fn tracked_repos_summary(&self, reports: &[UpdateReport]) -> Result<String> {
        let prompt = format!(
            r#"Analyze the recent updates of the following tracked GitHub projects and write a concise report covering:
1. The most active projects and their main changes
2. Important releases or major updates
3. Issues and pull requests worth attention

Updates:
{}
Write the report in {}."#,
            tracked_listing(reports),
            language_name(&self.language)
        );
        self.model.complete(&prompt).await
    }
}

fn tracked_listing(reports: &[UpdateReport]) -> String {
    let mut listing = String::new();
    for report in reports {
        let _ = writeln!(listing, "Project: {}", report.repository);
        if report.has_updates {
            let _ = writeln!(listing, "Recent activity:");
            for activity in report.activities.iter().take(ACTIVITIES_PER_REPO) {
                let _ = writeln!(listing, "- [{}] {}", activity.kind(), activity.headline());
                if let Some(description) = &activity.description {
                    let first = description.lines().next().unwrap_or_default();
                    let _ = writeln!(listing, "  {}", first);
                }
            }
        } else {
            let _ = writeln!(listing, "No recent activity.");
        }
        listing.push('\n');
    }
    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelProvider;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use repopulse_core::{ActivityDetail, ActivityItem};
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn provider(&self) -> ModelProvider {
            ModelProvider::Zhipu
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("report".to_string())
        }
    }

    fn report(activity_count: usize) -> UpdateReport {
        let base = DateTime::parse_from_rfc3339("2026-10-19T08:00:00+08:00").unwrap();
        let activities = (0..activity_count)
            .map(|i| {
                ActivityItem::new(
                    format!("Commit number {}", i),
                    base - Duration::minutes(i as i64),
                    "https://github.com/octocat/Hello-World".to_string(),
                    ActivityDetail::Commit {
                        sha: format!("{}", i),
                        author: "octocat".to_string(),
                    },
                )
            })
            .collect::<Vec<_>>();
        UpdateReport {
            repository: "octocat/Hello-World".to_string(),
            has_updates: !activities.is_empty(),
            activities,
        }
    }

    #[tokio::test]
    async fn test_tracked_summary_caps_activities_per_repo() {
        let model = Arc::new(EchoModel::default());
        let service = SummaryService::new(model.clone(), "zh");

        let text = service.tracked_repos_summary(&[report(8)]).await.unwrap();
        assert_eq!(text, "report");

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Commit number 4"));
        assert!(!prompts[0].contains("Commit number 5"));
        assert!(prompts[0].contains("Simplified Chinese"));
    }

    #[test]
    fn test_quiet_repository_listed() {
        let listing = tracked_listing(&[report(0)]);
        assert!(listing.contains("No recent activity."));
    }

    #[tokio::test]
    async fn test_hot_repos_prompt_lists_projects() {
        let model = Arc::new(EchoModel::default());
        let service = SummaryService::new(model.clone(), "en");
        let repo = RepoSummary {
            stars: 1200,
            ..RepoSummary::new("a/fast-thing".to_string(), "https://github.com/a/fast-thing".to_string())
        };

        service.hot_repos_summary(&[repo]).await.unwrap();
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Project: a/fast-thing"));
        assert!(prompts[0].contains("Stars: 1200"));
    }
}
