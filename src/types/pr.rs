use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::PullRequestAuthor;

// ---------------------------------------------------------------------------
// PR-specific enums
// ---------------------------------------------------------------------------

/// How the author of a pull request relates to the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorCategory {
    Me,
    MyTeam,
    Contributors,
}

impl AuthorCategory {
    pub const ALL: [Self; 3] = [Self::Me, Self::MyTeam, Self::Contributors];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Me => "me",
            Self::MyTeam => "myTeam",
            Self::Contributors => "contributors",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Me => "My PRs",
            Self::MyTeam => "My Team's PRs",
            Self::Contributors => "Contributors' PRs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Merge/review status tags. A pull request carries one or more of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    NeedsReview,
    HasMergeConflicts,
    HasRequiredChanges,
    HasMissingTests,
    HasFailingRequiredChecks,
    IsBlocked,
    /// Selectable in the filter but never derived from API data.
    NeedsDecision,
    IsReadyToMerge,
}

impl Status {
    pub const ALL: [Self; 8] = [
        Self::NeedsReview,
        Self::HasMergeConflicts,
        Self::HasRequiredChanges,
        Self::HasMissingTests,
        Self::HasFailingRequiredChecks,
        Self::IsBlocked,
        Self::NeedsDecision,
        Self::IsReadyToMerge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NeedsReview => "needsReview",
            Self::HasMergeConflicts => "hasMergeConflicts",
            Self::HasRequiredChanges => "hasRequiredChanges",
            Self::HasMissingTests => "hasMissingTests",
            Self::HasFailingRequiredChecks => "hasFailingRequiredChecks",
            Self::IsBlocked => "isBlocked",
            Self::NeedsDecision => "needsDecision",
            Self::IsReadyToMerge => "isReadyToMerge",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NeedsReview => "Needs a review",
            Self::HasMergeConflicts => "Has merge conflicts",
            Self::HasRequiredChanges => "Has required changes",
            Self::HasMissingTests => "Missing tests",
            Self::HasFailingRequiredChecks => "Has failing required checks",
            Self::IsBlocked => "Blocked",
            Self::NeedsDecision => "Needs a decision",
            Self::IsReadyToMerge => "Ready to merge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

// ---------------------------------------------------------------------------
// PR domain type
// ---------------------------------------------------------------------------

/// A normalized open pull request, built once from an API record.
///
/// `number` is the natural key. `statuses` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub author: PullRequestAuthor,
    pub author_categories: Vec<AuthorCategory>,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub label_names: Vec<String>,
    /// 0 (none) through 4 (urgent).
    #[serde(default)]
    pub priority_level: u8,
    pub statuses: Vec<Status>,
    #[serde(rename = "isCreatedByMetaMaskian", default)]
    pub is_created_by_metamaskian: bool,
}

impl PullRequest {
    pub fn has_label(&self, name: &str) -> bool {
        self.label_names.iter().any(|l| l == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_values_round_trip_through_their_names() {
        for category in AuthorCategory::ALL {
            assert_eq!(AuthorCategory::parse(category.as_str()), Some(category));
        }
        for status in Status::ALL {
            assert_eq!(Status::parse(status.as_str()), Some(status));
        }
        assert_eq!(Status::parse("isReadyToMerge"), Some(Status::IsReadyToMerge));
        assert_eq!(Status::parse("ready"), None);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Status::HasFailingRequiredChecks).unwrap();
        assert_eq!(json, "\"hasFailingRequiredChecks\"");
        let json = serde_json::to_string(&AuthorCategory::MyTeam).unwrap();
        assert_eq!(json, "\"myTeam\"");
    }
}
