use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::reconciler::{PullRequestsRequestStatus, RequestStatusKind};
use crate::types::{FilterColumn, PullRequest, SortColumn, ViewModifiers};
use crate::util::{expand_emoji, format_date, pad_to_width, truncate_to_width};

pub const LOADING_PLACEHOLDER: &str = "Loading pull requests...";
pub const NO_MATCHES_MESSAGE: &str = "No pull requests match the selected filters.";

/// Marker shown next to authors who belong to the core organization.
pub const CORE_ORG_MARKER: &str = "*";

// ---------------------------------------------------------------------------
// Column definitions
// ---------------------------------------------------------------------------

struct Column {
    header: &'static str,
    /// `None` takes whatever width is left.
    fixed_width: Option<usize>,
    sort: Option<SortColumn>,
}

const COLUMNS: [Column; 6] = [
    Column {
        header: "#",
        fixed_width: Some(7),
        sort: None,
    },
    Column {
        header: "Title",
        fixed_width: None,
        sort: None,
    },
    Column {
        header: "Author",
        fixed_width: Some(18),
        sort: None,
    },
    Column {
        header: "Age",
        fixed_width: Some(11),
        sort: Some(SortColumn::CreatedAt),
    },
    Column {
        header: "Priority",
        fixed_width: Some(10),
        sort: Some(SortColumn::PriorityLevel),
    },
    Column {
        header: "Statuses",
        fixed_width: Some(40),
        sort: Some(SortColumn::Statuses),
    },
];

const MIN_TITLE_WIDTH: usize = 20;
const GAP: &str = "  ";

/// Settings for one render pass.
#[derive(Debug, Clone)]
pub struct RenderOptions<'a> {
    pub date_format: &'a str,
    pub now: DateTime<Utc>,
    /// Total line width in terminal columns.
    pub width: usize,
}

/// Render the pull request list the way it should look for `status`.
///
/// The loading placeholder only replaces the table before the first load;
/// later reloads keep showing the previous rows.
pub fn render_pull_requests(
    status: &PullRequestsRequestStatus,
    modifiers: &ViewModifiers,
    has_loaded_once: bool,
    opts: &RenderOptions<'_>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", filter_summary(modifiers));

    if let Some(message) = &status.error_message
        && status.kind == RequestStatusKind::Error
    {
        let _ = writeln!(out, "{message}");
    }

    let loading = matches!(status.kind, RequestStatusKind::Pending | RequestStatusKind::Loading);
    if loading && !has_loaded_once {
        let _ = writeln!(out, "{LOADING_PLACEHOLDER}");
        return out;
    }

    let pull_requests = &status.data.filtered_pull_requests;
    if pull_requests.is_empty() {
        if has_loaded_once {
            let _ = writeln!(out, "{NO_MATCHES_MESSAGE}");
        }
        return out;
    }

    let widths = column_widths(opts.width);
    let _ = writeln!(out, "{}", header_line(modifiers, &widths));
    for pr in pull_requests {
        let _ = writeln!(out, "{}", format_line(&pr_to_row(pr, opts), &widths));
    }
    out
}

/// `Authors: All PRs | Statuses: Needs a review, Blocked`
pub fn filter_summary(modifiers: &ViewModifiers) -> String {
    let filters = &modifiers.filters;
    format!(
        "Authors: {} | Statuses: {}",
        filters
            .author_categories_selection()
            .summary_label(FilterColumn::AuthorCategories),
        filters
            .statuses_selection()
            .summary_label(FilterColumn::Statuses),
    )
}

/// One pull request as display cells, in column order.
pub fn pr_to_row(pr: &PullRequest, opts: &RenderOptions<'_>) -> Vec<String> {
    let author = if pr.is_created_by_metamaskian {
        format!("@{}{CORE_ORG_MARKER}", pr.author.login)
    } else {
        format!("@{}", pr.author.login)
    };
    let statuses: Vec<&str> = pr.statuses.iter().map(|s| s.label()).collect();
    vec![
        format!("#{}", pr.number),
        expand_emoji(&pr.title).into_owned(),
        author,
        format_date(&pr.created_at, opts.date_format, opts.now),
        priority_label(pr.priority_level).to_owned(),
        statuses.join(", "),
    ]
}

fn priority_label(level: u8) -> &'static str {
    match level {
        4 => "urgent",
        3 => "high",
        2 => "normal",
        1 => "low",
        _ => "",
    }
}

fn column_widths(total: usize) -> Vec<usize> {
    let fixed: usize = COLUMNS.iter().filter_map(|c| c.fixed_width).sum();
    let gaps = GAP.len() * (COLUMNS.len() - 1);
    let flexible = total.saturating_sub(fixed + gaps).max(MIN_TITLE_WIDTH);
    COLUMNS
        .iter()
        .map(|c| c.fixed_width.unwrap_or(flexible))
        .collect()
}

fn header_line(modifiers: &ViewModifiers, widths: &[usize]) -> String {
    let cells: Vec<String> = COLUMNS
        .iter()
        .map(|c| match c.sort {
            Some(column) if column == modifiers.sorts.column => {
                let arrow = if modifiers.sorts.reverse { '▼' } else { '▲' };
                format!("{} {arrow}", c.header)
            }
            _ => c.header.to_owned(),
        })
        .collect();
    format_line(&cells, widths)
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| pad_to_width(&truncate_to_width(cell, w), w))
        .collect();
    padded.join(GAP).trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::PullRequestsData;
    use crate::types::{AuthorCategory, FilterModifiers, PullRequestAuthor, SortModifiers, Status};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn opts() -> RenderOptions<'static> {
        RenderOptions {
            date_format: "relative",
            now: now(),
            width: 120,
        }
    }

    fn pr(number: u64) -> PullRequest {
        PullRequest {
            author: PullRequestAuthor {
                login: "alice".to_owned(),
                avatar_url: String::new(),
                org_logins: vec!["MetaMask".to_owned()],
            },
            author_categories: vec![AuthorCategory::MyTeam],
            number,
            title: "Fix :bug: in swaps".to_owned(),
            url: String::new(),
            created_at: now() - chrono::TimeDelta::hours(2),
            is_draft: false,
            label_names: vec![],
            priority_level: 4,
            statuses: vec![Status::NeedsReview, Status::IsBlocked],
            is_created_by_metamaskian: true,
        }
    }

    fn status(kind: RequestStatusKind, prs: Vec<PullRequest>) -> PullRequestsRequestStatus {
        PullRequestsRequestStatus {
            kind,
            data: PullRequestsData {
                unfiltered_pull_requests: prs.clone(),
                filtered_pull_requests: prs,
            },
            error_message: None,
        }
    }

    #[test]
    fn row_cells() {
        let row = pr_to_row(&pr(42), &opts());
        assert_eq!(row[0], "#42");
        assert_eq!(row[1], "Fix \u{1f41b} in swaps");
        assert_eq!(row[2], "@alice*");
        assert_eq!(row[3], "2h");
        assert_eq!(row[4], "urgent");
        assert_eq!(row[5], "Needs a review, Blocked");
    }

    #[test]
    fn placeholder_before_first_load() {
        let out = render_pull_requests(
            &status(RequestStatusKind::Loading, vec![]),
            &ViewModifiers::default(),
            false,
            &opts(),
        );
        assert!(out.contains(LOADING_PLACEHOLDER));
        assert!(!out.contains(NO_MATCHES_MESSAGE));
    }

    #[test]
    fn no_matches_is_distinct_from_loading() {
        let out = render_pull_requests(
            &status(RequestStatusKind::Loaded, vec![]),
            &ViewModifiers::default(),
            true,
            &opts(),
        );
        assert!(out.contains(NO_MATCHES_MESSAGE));
        assert!(!out.contains(LOADING_PLACEHOLDER));
    }

    #[test]
    fn error_is_shown_inline_above_previous_rows() {
        let mut s = status(RequestStatusKind::Error, vec![pr(7)]);
        s.error_message = Some("Couldn't fetch pull requests: boom".to_owned());
        let out = render_pull_requests(&s, &ViewModifiers::default(), true, &opts());
        assert!(out.contains("Couldn't fetch pull requests: boom"));
        assert!(out.contains("#7"));
    }

    #[test]
    fn header_marks_the_sorted_column() {
        let modifiers = ViewModifiers {
            filters: FilterModifiers::all_selected(),
            sorts: SortModifiers {
                column: SortColumn::PriorityLevel,
                reverse: true,
            },
        };
        let out = render_pull_requests(
            &status(RequestStatusKind::Loaded, vec![pr(1)]),
            &modifiers,
            true,
            &opts(),
        );
        assert!(out.contains("Priority ▼"));
        assert!(out.starts_with("Authors: All PRs | Statuses: Any status"));
    }

    #[test]
    fn long_titles_are_cut_to_the_line_width() {
        let mut long = pr(3);
        long.title = "x".repeat(300);
        let out = render_pull_requests(
            &status(RequestStatusKind::Loaded, vec![long]),
            &ViewModifiers::default(),
            true,
            &opts(),
        );
        let row = out.lines().last().unwrap();
        assert!(unicode_width::UnicodeWidthStr::width(row) <= 120);
        assert!(row.contains('…'));
    }
}
