use crate::{ActivityItem, ActivitySnapshot};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateReport {
    pub repository: String,
    pub has_updates: bool,
    /// Items newer than the cutoff, newest first
    pub activities: Vec<ActivityItem>,
}

/// Flag the items of `snapshot` that are newer than `cutoff`.
///
/// An item counts only when its timestamp is strictly after the cutoff; an
/// item stamped exactly at the cutoff is not new. Output is ordered by
/// timestamp descending whatever the kind, with equal timestamps keeping
/// their snapshot order.
pub fn detect(snapshot: &ActivitySnapshot, cutoff: DateTime<FixedOffset>) -> UpdateReport {
    let mut activities: Vec<ActivityItem> = snapshot
        .items
        .iter()
        .filter(|item| item.timestamp > cutoff)
        .cloned()
        .collect();

    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    UpdateReport {
        repository: snapshot.repository.clone(),
        has_updates: !activities.is_empty(),
        activities,
    }
}
