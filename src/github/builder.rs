//! Conversion from raw GraphQL nodes to domain pull requests.

use chrono::{DateTime, Utc};

use crate::github::graphql::{RawAuthor, RawPullRequest};
use crate::github::types::{MergeableState, ReviewDecision, StatusState};
use crate::types::{AuthorCategory, PullRequest, PullRequestAuthor, SignedInUser, Status};

/// Organization whose members are flagged as core contributors.
pub const DEFAULT_CORE_ORG: &str = "MetaMask";

const BLOCKED_LABEL: &str = "blocked";
const NEEDS_TESTS_LABEL: &str = "needs-tests";

/// Severity labels on closing issues, highest first.
const SEVERITY_LABELS: [(&str, u8); 4] = [
    ("Sev0-urgent", 4),
    ("Sev1-high", 3),
    ("Sev2-normal", 2),
    ("Sev3-low", 1),
];

fn build_author(raw: Option<RawAuthor>) -> PullRequestAuthor {
    match raw {
        Some(author) => PullRequestAuthor {
            org_logins: author
                .organizations
                .map(|orgs| orgs.iter().map(|o| o.login.clone()).collect())
                .unwrap_or_default(),
            login: author.login,
            avatar_url: author.avatar_url,
        },
        None => PullRequestAuthor::ghost(),
    }
}

fn author_categories(author: &PullRequestAuthor, user: &SignedInUser) -> Vec<AuthorCategory> {
    let mut categories = Vec::with_capacity(2);
    if author.login == user.login {
        categories.push(AuthorCategory::Me);
    }
    if author.shares_org_with(&user.org_logins) {
        categories.push(AuthorCategory::MyTeam);
    } else {
        categories.push(AuthorCategory::Contributors);
    }
    categories
}

fn statuses(raw: &RawPullRequest, label_names: &[String]) -> Vec<Status> {
    let mut statuses = Vec::new();

    match raw.review_decision {
        Some(ReviewDecision::ReviewRequired) => statuses.push(Status::NeedsReview),
        Some(ReviewDecision::ChangesRequested) => statuses.push(Status::HasRequiredChanges),
        _ => {}
    }

    if raw.mergeable == Some(MergeableState::Conflicting) {
        statuses.push(Status::HasMergeConflicts);
    }

    // Only the most recent commit is requested.
    let has_failing_checks = raw
        .commits
        .as_ref()
        .and_then(|commits| commits.iter().next())
        .and_then(|node| node.commit.status.as_ref())
        .is_some_and(|status| {
            status
                .contexts
                .iter()
                .any(|c| c.state == StatusState::Failure)
        });
    if has_failing_checks {
        statuses.push(Status::HasFailingRequiredChecks);
    }

    if statuses.is_empty() {
        statuses.push(Status::IsReadyToMerge);
    }

    if label_names.iter().any(|l| l == BLOCKED_LABEL) {
        statuses.push(Status::IsBlocked);
    }
    if label_names.iter().any(|l| l == NEEDS_TESTS_LABEL) {
        statuses.push(Status::HasMissingTests);
    }

    statuses
}

fn priority_level(raw: &RawPullRequest) -> u8 {
    let mut issue_labels: Vec<&str> = raw
        .closing_issues_references
        .iter()
        .flat_map(|issues| issues.iter())
        .filter_map(|issue| issue.labels.as_ref())
        .flat_map(|labels| labels.iter().map(|l| l.name.as_str()))
        .collect();
    issue_labels.sort_unstable();
    issue_labels.dedup();

    SEVERITY_LABELS
        .iter()
        .find(|(name, _)| issue_labels.contains(name))
        .map_or(0, |(_, level)| *level)
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("unparseable timestamp {value:?}: {e}");
            None
        }
    }
}

/// Build a domain pull request from an API node, from the point of view of
/// the signed-in `user`.
pub fn build_pull_request(raw: RawPullRequest, user: &SignedInUser, core_org: &str) -> PullRequest {
    let label_names: Vec<String> = raw
        .labels
        .as_ref()
        .map(|labels| labels.iter().map(|l| l.name.clone()).collect())
        .unwrap_or_default();
    let statuses = statuses(&raw, &label_names);
    let priority_level = priority_level(&raw);
    // Drafts have no `publishedAt` until they are marked ready.
    let created_at = parse_timestamp(raw.published_at.as_deref())
        .or_else(|| parse_timestamp(raw.created_at.as_deref()))
        .unwrap_or(DateTime::UNIX_EPOCH);

    let author = build_author(raw.author);
    let author_categories = author_categories(&author, user);
    let is_created_by_metamaskian = author.is_member_of(core_org);

    PullRequest {
        author,
        author_categories,
        number: raw.number,
        title: raw.title,
        url: raw.url,
        created_at,
        is_draft: raw.is_draft,
        label_names,
        priority_level,
        statuses,
        is_created_by_metamaskian,
    }
}
