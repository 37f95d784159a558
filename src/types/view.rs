use serde::{Deserialize, Serialize};

use super::pr::{AuthorCategory, Status};

// ---------------------------------------------------------------------------
// Filter columns and their option values
// ---------------------------------------------------------------------------

/// A value that can be selected in a filter column.
pub trait FilterOption: Copy + Eq + Ord + 'static {
    /// Every valid option, in display order.
    const VALID: &'static [Self];

    fn as_str(self) -> &'static str;
    fn label(self) -> &'static str;
    fn parse(s: &str) -> Option<Self>;
}

impl FilterOption for AuthorCategory {
    const VALID: &'static [Self] = &AuthorCategory::ALL;

    fn as_str(self) -> &'static str {
        AuthorCategory::as_str(self)
    }
    fn label(self) -> &'static str {
        AuthorCategory::label(self)
    }
    fn parse(s: &str) -> Option<Self> {
        AuthorCategory::parse(s)
    }
}

impl FilterOption for Status {
    const VALID: &'static [Self] = &Status::ALL;

    fn as_str(self) -> &'static str {
        Status::as_str(self)
    }
    fn label(self) -> &'static str {
        Status::label(self)
    }
    fn parse(s: &str) -> Option<Self> {
        Status::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterColumn {
    AuthorCategories,
    Statuses,
}

impl FilterColumn {
    pub const ALL: [Self; 2] = [Self::AuthorCategories, Self::Statuses];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthorCategories => "authorCategories",
            Self::Statuses => "statuses",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    pub fn label_when_all_selected(self) -> &'static str {
        match self {
            Self::AuthorCategories => "All PRs",
            Self::Statuses => "Any status",
        }
    }

    pub fn label_when_none_selected(self) -> &'static str {
        match self {
            Self::AuthorCategories => "No PRs",
            Self::Statuses => "No status",
        }
    }
}

// ---------------------------------------------------------------------------
// Filter selection (tri-state)
// ---------------------------------------------------------------------------

/// Explicit selection state of one filter column.
///
/// `All` and "every valid option listed individually" are equivalent;
/// [`FilterSelection::from_values`] collapses the latter into the former.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSelection<V: FilterOption> {
    All,
    None,
    Some(Vec<V>),
}

impl<V: FilterOption> FilterSelection<V> {
    pub fn from_values(values: &[V]) -> Self {
        let normalized = normalized(values);
        if normalized.is_empty() {
            Self::None
        } else if normalized == normalized_valid::<V>() {
            Self::All
        } else {
            Self::Some(dedup_ordered(values))
        }
    }

    /// Dropdown summary: fixed labels for all/none, otherwise up to two
    /// option labels followed by an ellipsis.
    pub fn summary_label(&self, column: FilterColumn) -> String {
        match self {
            Self::All => column.label_when_all_selected().to_owned(),
            Self::None => column.label_when_none_selected().to_owned(),
            Self::Some(values) => {
                let labels: Vec<&str> = values.iter().map(|v| v.label()).collect();
                if labels.len() > 2 {
                    format!("{}, ...", labels[..2].join(", "))
                } else {
                    labels.join(", ")
                }
            }
        }
    }
}

fn normalized<V: FilterOption>(values: &[V]) -> Vec<V> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

fn normalized_valid<V: FilterOption>() -> Vec<V> {
    normalized(V::VALID)
}

/// Remove duplicates, keeping the first occurrence of each value.
pub(crate) fn dedup_ordered<V: FilterOption>(values: &[V]) -> Vec<V> {
    let mut out: Vec<V> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(v) {
            out.push(*v);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// View modifiers
// ---------------------------------------------------------------------------

/// Selected values per filter column. `None` means the column is absent
/// from the modifier set; `Some(vec![])` means nothing is selected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterModifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_categories: Option<Vec<AuthorCategory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<Status>>,
}

impl FilterModifiers {
    /// Every valid option of every column selected.
    pub fn all_selected() -> Self {
        Self {
            author_categories: Some(AuthorCategory::ALL.to_vec()),
            statuses: Some(Status::ALL.to_vec()),
        }
    }

    /// True when no column is present at all.
    pub fn is_empty(&self) -> bool {
        self.author_categories.is_none() && self.statuses.is_none()
    }

    /// Column-wise overlay: columns present in `update` replace ours.
    pub fn merged_with(&self, update: &Self) -> Self {
        Self {
            author_categories: update
                .author_categories
                .clone()
                .or_else(|| self.author_categories.clone()),
            statuses: update.statuses.clone().or_else(|| self.statuses.clone()),
        }
    }

    /// Membership equality that ignores selection order and duplicates.
    pub fn same_selection(&self, other: &Self) -> bool {
        self.author_categories.as_deref().map(normalized)
            == other.author_categories.as_deref().map(normalized)
            && self.statuses.as_deref().map(normalized) == other.statuses.as_deref().map(normalized)
    }

    pub fn author_categories_selection(&self) -> FilterSelection<AuthorCategory> {
        FilterSelection::from_values(self.author_categories.as_deref().unwrap_or_default())
    }

    pub fn statuses_selection(&self) -> FilterSelection<Status> {
        FilterSelection::from_values(self.statuses.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    #[default]
    CreatedAt,
    PriorityLevel,
    Statuses,
}

impl SortColumn {
    pub const ALL: [Self; 3] = [Self::CreatedAt, Self::PriorityLevel, Self::Statuses];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::PriorityLevel => "priorityLevel",
            Self::Statuses => "statuses",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CreatedAt => "Created",
            Self::PriorityLevel => "Priority",
            Self::Statuses => "Status",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortModifiers {
    pub column: SortColumn,
    pub reverse: bool,
}

impl SortModifiers {
    /// Clicking the active column flips direction; any other column starts
    /// ascending.
    pub fn toggled_on(self, column: SortColumn) -> Self {
        Self {
            column,
            reverse: if self.column == column {
                !self.reverse
            } else {
                false
            },
        }
    }
}

/// Filters plus sort order: what the user currently sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModifiers {
    pub filters: FilterModifiers,
    pub sorts: SortModifiers,
}

impl Default for ViewModifiers {
    fn default() -> Self {
        Self {
            filters: FilterModifiers::all_selected(),
            sorts: SortModifiers::default(),
        }
    }
}

impl ViewModifiers {
    pub fn merged_with(&self, update: &PartialViewModifiers) -> Self {
        Self {
            filters: update
                .filters
                .as_ref()
                .map_or_else(|| self.filters.clone(), |f| self.filters.merged_with(f)),
            sorts: update.sorts.unwrap_or(self.sorts),
        }
    }

    pub fn same_as(&self, other: &Self) -> bool {
        self.sorts == other.sorts && self.filters.same_selection(&other.filters)
    }
}

/// An update to some of the view modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialViewModifiers {
    pub filters: Option<FilterModifiers>,
    pub sorts: Option<SortModifiers>,
}

impl PartialViewModifiers {
    pub fn filters(filters: FilterModifiers) -> Self {
        Self {
            filters: Some(filters),
            sorts: None,
        }
    }

    pub fn sorts(sorts: SortModifiers) -> Self {
        Self {
            filters: None,
            sorts: Some(sorts),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_none() && self.sorts.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_collapses_full_membership_to_all() {
        let all = FilterSelection::from_values(&[
            AuthorCategory::Contributors,
            AuthorCategory::Me,
            AuthorCategory::MyTeam,
        ]);
        assert_eq!(all, FilterSelection::All);
        assert_eq!(
            FilterSelection::<Status>::from_values(&[]),
            FilterSelection::None
        );
        assert_eq!(
            FilterSelection::from_values(&[Status::IsBlocked, Status::IsBlocked]),
            FilterSelection::Some(vec![Status::IsBlocked])
        );
    }

    #[test]
    fn summary_labels() {
        assert_eq!(
            FilterSelection::<Status>::All.summary_label(FilterColumn::Statuses),
            "Any status"
        );
        assert_eq!(
            FilterSelection::<AuthorCategory>::None.summary_label(FilterColumn::AuthorCategories),
            "No PRs"
        );
        let sel = FilterSelection::Some(vec![
            Status::NeedsReview,
            Status::IsBlocked,
            Status::HasMissingTests,
        ]);
        assert_eq!(
            sel.summary_label(FilterColumn::Statuses),
            "Needs a review, Blocked, ..."
        );
    }

    #[test]
    fn same_selection_ignores_order_but_not_membership() {
        let a = FilterModifiers {
            author_categories: Some(vec![AuthorCategory::Me, AuthorCategory::MyTeam]),
            statuses: Some(vec![]),
        };
        let b = FilterModifiers {
            author_categories: Some(vec![AuthorCategory::MyTeam, AuthorCategory::Me]),
            statuses: Some(vec![]),
        };
        let c = FilterModifiers {
            author_categories: Some(vec![AuthorCategory::MyTeam]),
            statuses: Some(vec![]),
        };
        assert!(a.same_selection(&b));
        assert!(!a.same_selection(&c));
        assert!(!a.same_selection(&FilterModifiers::default()));
    }

    #[test]
    fn merge_overlays_present_columns_only() {
        let base = FilterModifiers::all_selected();
        let update = FilterModifiers {
            author_categories: Some(vec![AuthorCategory::Me]),
            statuses: None,
        };
        let merged = base.merged_with(&update);
        assert_eq!(merged.author_categories, Some(vec![AuthorCategory::Me]));
        assert_eq!(merged.statuses, Some(Status::ALL.to_vec()));
    }

    #[test]
    fn sort_toggle() {
        let s = SortModifiers::default();
        let s = s.toggled_on(SortColumn::CreatedAt);
        assert!(s.reverse);
        let s = s.toggled_on(SortColumn::PriorityLevel);
        assert_eq!(s.column, SortColumn::PriorityLevel);
        assert!(!s.reverse);
    }
}
