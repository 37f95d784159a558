use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};

use crate::config::types::AppConfig;
use crate::engine::{EngineHandle, Request};
use crate::history::History;
use crate::reconciler::{Applied, Reconciler};
use crate::session::SessionStore;
use crate::types::{
    AuthorCategory, FilterColumn, FilterModifiers, FilterOption, PartialViewModifiers, SortColumn,
    SortModifiers, Status, ViewModifiers,
};
use crate::views::{RenderOptions, render_pull_requests};

/// How long to wait for the engine before giving up on a load.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// View modifiers requested on the command line.
#[derive(Debug, Clone, Default)]
pub struct ViewArgs {
    /// Raw `column=v1,v2` arguments.
    pub filters: Vec<String>,
    pub sort: Option<String>,
    pub reverse: bool,
}

/// Turn the command-line view arguments into one update.
///
/// `--reverse` without `--sort` flips the direction of the current column.
pub fn cli_modifiers(args: &ViewArgs, current: &ViewModifiers) -> Result<PartialViewModifiers> {
    let mut update = PartialViewModifiers::default();

    for arg in &args.filters {
        let (column, values) = arg
            .split_once('=')
            .with_context(|| format!("invalid --filter {arg:?}, expected column=v1,v2"))?;
        let column = FilterColumn::parse(column).with_context(|| {
            format!("unknown filter column {column:?}, expected authorCategories or statuses")
        })?;
        let filters = update.filters.get_or_insert_with(FilterModifiers::default);
        match column {
            FilterColumn::AuthorCategories => {
                filters.author_categories = Some(parse_values::<AuthorCategory>(values)?);
            }
            FilterColumn::Statuses => {
                filters.statuses = Some(parse_values::<Status>(values)?);
            }
        }
    }

    if let Some(sort) = &args.sort {
        let column = SortColumn::parse(sort).with_context(|| {
            let valid: Vec<&str> = SortColumn::ALL.iter().map(|c| c.as_str()).collect();
            format!("unknown sort column {sort:?}, expected one of {}", valid.join(", "))
        })?;
        update.sorts = Some(SortModifiers {
            column,
            reverse: args.reverse,
        });
    } else if args.reverse {
        update.sorts = Some(SortModifiers {
            column: current.sorts.column,
            reverse: !current.sorts.reverse,
        });
    }

    Ok(update)
}

fn parse_values<V: FilterOption>(values: &str) -> Result<Vec<V>> {
    values
        .split(',')
        .filter(|v| !v.is_empty())
        .map(|v| {
            V::parse(v).with_context(|| {
                let valid: Vec<&str> = V::VALID.iter().map(|o| o.as_str()).collect();
                format!("unknown filter value {v:?}, expected one of {}", valid.join(", "))
            })
        })
        .collect()
}

/// Apply the CLI modifiers, load the pull requests through `engine` and
/// render them.
///
/// A rejected token signs the stored session out before failing.
pub fn run_dashboard<H: History>(
    config: &AppConfig,
    engine: &EngineHandle,
    sessions: &SessionStore,
    reconciler: &mut Reconciler<H>,
    args: &ViewArgs,
    refresh: bool,
    now: DateTime<Utc>,
) -> Result<String> {
    let update = cli_modifiers(args, reconciler.view_modifiers())?;
    if !update.is_empty() {
        reconciler.save_view_modifiers(&update)?;
    }

    let session = sessions.load();
    if session.signed_in().is_none() {
        bail!("not signed in; run `pr-dashboard login`");
    }
    let ticket = reconciler.begin_load(&session, refresh)?;

    let (reply_tx, reply_rx) = std::sync::mpsc::channel();
    engine.send(Request::FetchPullRequests {
        generation: ticket.generation,
        session: ticket.session,
        refresh: ticket.refresh,
        reply_tx,
    });

    loop {
        let event = match reply_rx.recv_timeout(FETCH_TIMEOUT) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                bail!("timed out waiting for pull requests after {FETCH_TIMEOUT:?}")
            }
            Err(RecvTimeoutError::Disconnected) => bail!("engine stopped before replying"),
        };
        match reconciler.handle_event(event)? {
            Applied::Stale => {}
            Applied::Loaded { count } => {
                tracing::info!("loaded {count} pull requests");
                break;
            }
            Applied::Failed {
                sign_in_required: true,
            } => {
                sessions
                    .clear()
                    .context("clearing the rejected session")?;
                let message = reconciler.status().error_message.clone().unwrap_or_default();
                bail!("{message}\nsigned out; run `pr-dashboard login` again");
            }
            Applied::Failed {
                sign_in_required: false,
            } => break,
        }
    }

    let opts = RenderOptions {
        date_format: &config.view.date_format,
        now,
        width: terminal_width(),
    };
    Ok(render_pull_requests(
        reconciler.status(),
        reconciler.view_modifiers(),
        reconciler.has_loaded_once(),
        &opts,
    ))
}

fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(120)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(filters: &[&str], sort: Option<&str>, reverse: bool) -> ViewArgs {
        ViewArgs {
            filters: filters.iter().map(|s| (*s).to_owned()).collect(),
            sort: sort.map(str::to_owned),
            reverse,
        }
    }

    #[test]
    fn filters_and_sort_combine_into_one_update() {
        let update = cli_modifiers(
            &args(
                &["authorCategories=me,myTeam", "statuses="],
                Some("priorityLevel"),
                true,
            ),
            &ViewModifiers::default(),
        )
        .unwrap();
        let filters = update.filters.unwrap();
        assert_eq!(
            filters.author_categories,
            Some(vec![AuthorCategory::Me, AuthorCategory::MyTeam])
        );
        assert_eq!(filters.statuses, Some(vec![]));
        assert_eq!(
            update.sorts,
            Some(SortModifiers {
                column: SortColumn::PriorityLevel,
                reverse: true,
            })
        );
    }

    #[test]
    fn reverse_alone_flips_current_direction() {
        let update = cli_modifiers(&args(&[], None, true), &ViewModifiers::default()).unwrap();
        assert_eq!(
            update.sorts,
            Some(SortModifiers {
                column: SortColumn::CreatedAt,
                reverse: true,
            })
        );
        assert!(update.filters.is_none());
    }

    #[test]
    fn no_arguments_is_an_empty_update() {
        let update = cli_modifiers(&ViewArgs::default(), &ViewModifiers::default()).unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn bad_arguments_are_rejected() {
        let current = ViewModifiers::default();
        assert!(cli_modifiers(&args(&["statuses"], None, false), &current).is_err());
        assert!(cli_modifiers(&args(&["labels=x"], None, false), &current).is_err());
        assert!(cli_modifiers(&args(&["statuses=ready"], None, false), &current).is_err());
        assert!(cli_modifiers(&args(&[], Some("title"), false), &current).is_err());
    }
}
