use crate::Result;
use handlebars::Handlebars;
use repopulse_core::{ActivityItem, ActivityKind, UpdateReport};
use serde::Serialize;

/// Items shown per kind per repository before collapsing into "+N more"
pub const ITEMS_PER_KIND: usize = 5;

const SUBJECT: &str = "GitHub project updates";

const TEMPLATE: &str = include_str!("../templates/digest.hbs");

/// One rendered notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub subject: String,
    pub html: String,
    /// Repositories with updates, in report order
    pub repositories: Vec<String>,
    /// Total updated items across all repositories
    pub total: usize,
}

#[derive(Serialize)]
struct DigestContext<'a> {
    count: usize,
    days: u32,
    plural: bool,
    /// Paragraphs, each split into lines
    summary: Option<Vec<Vec<&'a str>>>,
    repositories: Vec<RepositoryContext<'a>>,
}

#[derive(Serialize)]
struct RepositoryContext<'a> {
    name: &'a str,
    sections: Vec<SectionContext<'a>>,
}

#[derive(Serialize)]
struct SectionContext<'a> {
    heading: &'static str,
    count: usize,
    items: Vec<ItemContext<'a>>,
    more: Option<usize>,
}

#[derive(Serialize)]
struct ItemContext<'a> {
    url: &'a str,
    title: &'a str,
    meta: &'a str,
    when: String,
}

/// Render reports into a digest, or `None` when nothing has updates.
///
/// The output depends only on the reports, the lookback and the summary, so
/// two renders of the same input are byte-identical.
pub fn render(reports: &[UpdateReport], days: u32, summary: Option<&str>) -> Result<Option<Digest>> {
    let mut seen = std::collections::HashSet::new();
    let updated: Vec<&UpdateReport> = reports
        .iter()
        .filter(|r| r.has_updates)
        .filter(|r| seen.insert(r.repository.as_str()))
        .collect();
    if updated.is_empty() {
        return Ok(None);
    }

    let context = DigestContext {
        count: updated.len(),
        days,
        plural: days != 1,
        summary: summary
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.split("\n\n").map(|p| p.lines().collect()).collect()),
        repositories: updated.iter().map(|r| repository_context(r)).collect(),
    };
    let html = Handlebars::new().render_template(TEMPLATE, &context)?;

    Ok(Some(Digest {
        subject: SUBJECT.to_string(),
        html,
        repositories: updated.iter().map(|r| r.repository.clone()).collect(),
        total: updated.iter().map(|r| r.activities.len()).sum(),
    }))
}

fn repository_context(report: &UpdateReport) -> RepositoryContext<'_> {
    let sections = ActivityKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let items: Vec<&ActivityItem> = report
                .activities
                .iter()
                .filter(|item| item.kind() == kind)
                .collect();
            if items.is_empty() {
                return None;
            }
            Some(SectionContext {
                heading: kind.heading(),
                count: items.len(),
                more: items.len().checked_sub(ITEMS_PER_KIND).filter(|n| *n > 0),
                items: items.into_iter().take(ITEMS_PER_KIND).map(item_context).collect(),
            })
        })
        .collect();

    RepositoryContext {
        name: &report.repository,
        sections,
    }
}

fn item_context(item: &ActivityItem) -> ItemContext<'_> {
    ItemContext {
        url: &item.url,
        title: item.title_zh.as_deref().unwrap_or_else(|| item.headline()),
        meta: item.state_or_author(),
        when: item.timestamp.format("%Y-%m-%d %H:%M").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, FixedOffset};
    use repopulse_core::ActivityDetail;

    fn base() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-19T08:00:00+08:00").unwrap()
    }

    fn commits(n: usize) -> Vec<ActivityItem> {
        (0..n)
            .map(|i| {
                ActivityItem::new(
                    format!("Commit {}", i),
                    base() - Duration::minutes(i as i64),
                    format!("https://github.com/octocat/Hello-World/commit/{}", i),
                    ActivityDetail::Commit {
                        sha: i.to_string(),
                        author: "octocat".to_string(),
                    },
                )
            })
            .collect()
    }

    fn report(repository: &str, activities: Vec<ActivityItem>) -> UpdateReport {
        UpdateReport {
            repository: repository.to_string(),
            has_updates: !activities.is_empty(),
            activities,
        }
    }

    #[test]
    fn test_no_updates_renders_nothing() {
        assert!(render(&[report("a/b", vec![])], 7, None).unwrap().is_none());
        assert!(render(&[], 7, None).unwrap().is_none());
    }

    #[test]
    fn test_caps_items_per_kind() {
        let digest = render(&[report("octocat/Hello-World", commits(8))], 7, None).unwrap().unwrap();

        assert_eq!(digest.total, 8);
        assert!(digest.html.contains("Commits (8)"));
        assert!(digest.html.contains("Commit 4"));
        assert!(!digest.html.contains("Commit 5"));
        assert!(digest.html.contains("+3 more"));
    }

    #[test]
    fn test_quiet_repositories_omitted() {
        let digest = render(
            &[report("a/quiet", vec![]), report("a/busy", commits(1))],
            1,
            None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(digest.repositories, vec!["a/busy".to_string()]);
        assert!(!digest.html.contains("a/quiet"));
        assert!(digest.html.contains("last 1 day<"));
    }

    #[test]
    fn test_duplicate_repository_rendered_once() {
        let digest = render(&[report("a/b", commits(1)), report("a/b", commits(1))], 7, None)
            .unwrap()
            .unwrap();
        assert_eq!(digest.repositories.len(), 1);
        assert_eq!(digest.html.matches("<h3>").count(), 1);
    }

    #[test]
    fn test_translated_title_and_escaping() {
        let mut items = commits(1);
        items[0].title = "Use <T> & friends".to_string();
        let plain = render(&[report("a/b", items.clone())], 7, None).unwrap().unwrap();
        assert!(plain.html.contains("Use &lt;T&gt; &amp; friends"));

        items[0].title_zh = Some("泛型".to_string());
        let translated = render(&[report("a/b", items)], 7, None).unwrap().unwrap();
        assert!(translated.html.contains("泛型"));
    }

    #[test]
    fn test_summary_section() {
        let reports = [report("a/b", commits(2))];
        let with = render(&reports, 7, Some("Busy week.\n\nMostly fixes.")).unwrap().unwrap();
        assert!(with.html.contains("<p>Busy week.</p>"));
        assert!(with.html.contains("<p>Mostly fixes.</p>"));

        let without = render(&reports, 7, None).unwrap().unwrap();
        assert!(!without.html.contains("class=\"summary\""));
    }

    #[test]
    fn test_render_is_deterministic() {
        let reports = [report("a/b", commits(3))];
        assert_eq!(render(&reports, 7, None).unwrap(), render(&reports, 7, None).unwrap());
    }

    #[test]
    fn test_markup_in_fields_is_escaped() {
        let mut items = commits(1);
        items[0].title = "<script>alert(\"x\")</script>".to_string();
        let digest = render(&[report("a/b", items)], 7, Some("<b>bold</b>\nnext")).unwrap().unwrap();

        assert!(!digest.html.contains("<script>"));
        assert!(digest.html.contains("&lt;script&gt;"));
        assert!(!digest.html.contains("<b>bold</b>"));
        assert!(digest.html.contains("&lt;b&gt;bold&lt;/b&gt;<br>next"));
    }
}
