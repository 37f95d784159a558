use crate::types::{FilterModifiers, PullRequest};

/// Label that keeps a pull request off the dashboard regardless of filters.
pub const DO_NOT_MERGE_LABEL: &str = "DO-NOT-MERGE";

fn intersects<V: PartialEq>(values: &[V], selection: Option<&[V]>) -> bool {
    match selection {
        None | Some([]) => true,
        Some(selected) => values.iter().any(|v| selected.contains(v)),
    }
}

fn matches(pr: &PullRequest, filters: &FilterModifiers) -> bool {
    !pr.is_draft
        && !pr.has_label(DO_NOT_MERGE_LABEL)
        && intersects(&pr.author_categories, filters.author_categories.as_deref())
        && intersects(&pr.statuses, filters.statuses.as_deref())
}

/// Pull requests that pass every filter column.
///
/// With no filter columns at all nothing is returned. A column whose selection
/// is empty does not constrain the result.
pub fn filter_pull_requests(
    pull_requests: &[PullRequest],
    filters: Option<&FilterModifiers>,
) -> Vec<PullRequest> {
    let Some(filters) = filters.filter(|f| !f.is_empty()) else {
        return Vec::new();
    };
    pull_requests
        .iter()
        .filter(|pr| matches(pr, filters))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::types::{AuthorCategory, PullRequestAuthor, Status};

    fn pr(
        number: u64,
        login: &str,
        categories: &[AuthorCategory],
        statuses: &[Status],
    ) -> PullRequest {
        PullRequest {
            author: PullRequestAuthor {
                login: login.to_owned(),
                avatar_url: String::new(),
                org_logins: vec![],
            },
            author_categories: categories.to_vec(),
            number,
            title: format!("PR {number}"),
            url: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            is_draft: false,
            label_names: vec![],
            priority_level: 0,
            statuses: statuses.to_vec(),
            is_created_by_metamaskian: false,
        }
    }

    fn numbers(prs: &[PullRequest]) -> Vec<u64> {
        prs.iter().map(|p| p.number).collect()
    }

    #[test]
    fn empty_filters_return_nothing() {
        let prs = vec![pr(1, "a", &[AuthorCategory::Contributors], &[Status::IsReadyToMerge])];
        assert!(filter_pull_requests(&prs, None).is_empty());
        assert!(filter_pull_requests(&prs, Some(&FilterModifiers::default())).is_empty());
    }

    #[test]
    fn drafts_and_do_not_merge_always_excluded() {
        let mut draft = pr(1, "a", &[AuthorCategory::Contributors], &[Status::IsReadyToMerge]);
        draft.is_draft = true;
        let mut dnm = pr(2, "a", &[AuthorCategory::Contributors], &[Status::IsReadyToMerge]);
        dnm.label_names = vec![DO_NOT_MERGE_LABEL.to_owned()];
        let ok = pr(3, "a", &[AuthorCategory::Contributors], &[Status::IsReadyToMerge]);

        let out = filter_pull_requests(&[draft, dnm, ok], Some(&FilterModifiers::all_selected()));
        assert_eq!(numbers(&out), vec![3]);
    }

    #[test]
    fn only_me_with_empty_statuses() {
        let mine = pr(
            1,
            "alice",
            &[AuthorCategory::Me, AuthorCategory::MyTeam],
            &[Status::NeedsReview],
        );
        let theirs = pr(2, "bob", &[AuthorCategory::Contributors], &[Status::NeedsReview]);
        let filters = FilterModifiers {
            author_categories: Some(vec![AuthorCategory::Me]),
            statuses: Some(vec![]),
        };
        let out = filter_pull_requests(&[mine, theirs], Some(&filters));
        assert_eq!(numbers(&out), vec![1]);
    }

    #[test]
    fn every_present_column_must_intersect() {
        let prs = vec![
            pr(1, "a", &[AuthorCategory::MyTeam], &[Status::IsBlocked]),
            pr(2, "b", &[AuthorCategory::MyTeam], &[Status::IsReadyToMerge]),
            pr(3, "c", &[AuthorCategory::Contributors], &[Status::IsBlocked, Status::NeedsReview]),
        ];
        let filters = FilterModifiers {
            author_categories: Some(vec![AuthorCategory::MyTeam]),
            statuses: Some(vec![Status::IsBlocked]),
        };
        let out = filter_pull_requests(&prs, Some(&filters));
        assert_eq!(numbers(&out), vec![1]);
        for p in &out {
            assert!(p.author_categories.contains(&AuthorCategory::MyTeam));
            assert!(p.statuses.contains(&Status::IsBlocked));
        }
    }

    #[test]
    fn absent_column_is_unconstrained() {
        let prs = vec![
            pr(1, "a", &[AuthorCategory::MyTeam], &[Status::IsBlocked]),
            pr(2, "b", &[AuthorCategory::Contributors], &[Status::IsReadyToMerge]),
        ];
        let filters = FilterModifiers {
            author_categories: None,
            statuses: Some(vec![Status::IsReadyToMerge]),
        };
        assert_eq!(numbers(&filter_pull_requests(&prs, Some(&filters))), vec![2]);
    }

    #[test]
    fn preserves_input_order() {
        let prs = vec![
            pr(9, "a", &[AuthorCategory::MyTeam], &[Status::IsBlocked]),
            pr(2, "b", &[AuthorCategory::MyTeam], &[Status::IsBlocked]),
            pr(5, "c", &[AuthorCategory::MyTeam], &[Status::IsBlocked]),
        ];
        let out = filter_pull_requests(&prs, Some(&FilterModifiers::all_selected()));
        assert_eq!(numbers(&out), vec![9, 2, 5]);
    }
}
