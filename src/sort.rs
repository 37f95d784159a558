use chrono::{DateTime, Utc};

use crate::types::{PullRequest, SortColumn, SortModifiers};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Time(DateTime<Utc>),
    Priority(u8),
    Statuses(String),
}

fn sort_key(pr: &PullRequest, column: SortColumn) -> SortKey {
    match column {
        SortColumn::CreatedAt => SortKey::Time(pr.created_at),
        SortColumn::PriorityLevel => SortKey::Priority(pr.priority_level),
        // Status lists compare as their comma-joined wire names.
        SortColumn::Statuses => SortKey::Statuses(
            pr.statuses
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

/// Order pull requests by `sorts.column`, ties broken by ascending number.
///
/// For the priority column, pull requests without a priority keep their
/// relative order and always come last; `reverse` only flips the prioritized
/// part. Without `sorts` the input order is kept.
pub fn sort_pull_requests(
    pull_requests: &[PullRequest],
    sorts: Option<&SortModifiers>,
) -> Vec<PullRequest> {
    let Some(sorts) = sorts else {
        return pull_requests.to_vec();
    };

    let (mut sorted, unprioritized): (Vec<PullRequest>, Vec<PullRequest>) =
        if sorts.column == SortColumn::PriorityLevel {
            pull_requests
                .iter()
                .cloned()
                .partition(|pr| pr.priority_level > 0)
        } else {
            (pull_requests.to_vec(), Vec::new())
        };

    sorted.sort_by_cached_key(|pr| (sort_key(pr, sorts.column), pr.number));
    if sorts.reverse {
        sorted.reverse();
    }
    sorted.extend(unprioritized);
    sorted
}
