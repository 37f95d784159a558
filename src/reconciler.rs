//! Keeps the in-memory view modifiers, the navigable query history and the
//! filtered/sorted pull requests consistent.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::clock::Clock;
use crate::engine::{Event, FailureKind};
use crate::filter::filter_pull_requests;
use crate::history::History;
use crate::query::{Query, build_query, extract_view_modifiers};
use crate::sort::sort_pull_requests;
use crate::types::{
    FilterModifiers, PartialViewModifiers, PullRequest, Session, SignedInSession, SortColumn,
    SortModifiers, ViewModifiers,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error(
        "the query history was updated again within {window_ms}ms of the previous update; \
         you may be in an infinite loop"
    )]
    PossibleInfiniteLoop { window_ms: i64 },
    #[error("not signed in")]
    NotSignedIn,
    #[error("{0}")]
    Fatal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatusKind {
    Pending,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestsData {
    pub unfiltered_pull_requests: Vec<PullRequest>,
    pub filtered_pull_requests: Vec<PullRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestsRequestStatus {
    pub kind: RequestStatusKind,
    pub data: PullRequestsData,
    pub error_message: Option<String>,
}

impl Default for PullRequestsRequestStatus {
    fn default() -> Self {
        Self {
            kind: RequestStatusKind::Pending,
            data: PullRequestsData::default(),
            error_message: None,
        }
    }
}

/// What a load needs, stamped with the generation it belongs to.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: u64,
    pub session: SignedInSession,
    pub refresh: bool,
}

/// Outcome of [`Reconciler::handle_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Loaded { count: usize },
    Failed { sign_in_required: bool },
    /// The event answered an older load and was ignored.
    Stale,
}

pub struct Reconciler<H: History> {
    view_modifiers: ViewModifiers,
    status: PullRequestsRequestStatus,
    has_loaded_once: bool,
    history: H,
    clock: Arc<dyn Clock>,
    loop_guard: TimeDelta,
    last_push_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl<H: History> Reconciler<H> {
    /// Seed the view modifiers from the current history entry.
    pub fn new(history: H, clock: Arc<dyn Clock>, loop_guard: TimeDelta) -> Self {
        let view_modifiers = extract_view_modifiers(history.current()).view_modifiers;
        tracing::debug!("reconciler: initial view modifiers {view_modifiers:?}");
        Self {
            view_modifiers,
            status: PullRequestsRequestStatus::default(),
            has_loaded_once: false,
            history,
            clock,
            loop_guard,
            last_push_at: None,
            generation: 0,
        }
    }

    pub fn view_modifiers(&self) -> &ViewModifiers {
        &self.view_modifiers
    }

    pub fn status(&self) -> &PullRequestsRequestStatus {
        &self.status
    }

    pub fn has_loaded_once(&self) -> bool {
        self.has_loaded_once
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn current_query(&self) -> &Query {
        self.history.current()
    }

    /// Apply `update` to the in-memory modifiers and, when the modifiers
    /// visible in the query actually change, push a new history entry.
    ///
    /// Returns whether an entry was pushed. Two pushes closer together than
    /// the loop guard window fail with
    /// [`ReconcileError::PossibleInfiniteLoop`]; the in-memory update is kept.
    pub fn save_view_modifiers(
        &mut self,
        update: &PartialViewModifiers,
    ) -> Result<bool, ReconcileError> {
        let existing = extract_view_modifiers(self.history.current());
        let new_query = build_query(update, &existing);
        let changed = !existing
            .view_modifiers
            .same_as(&existing.view_modifiers.merged_with(update));

        self.view_modifiers = self.view_modifiers.merged_with(update);
        if self.status.kind == RequestStatusKind::Loaded {
            self.recompute();
        }

        if !changed {
            tracing::debug!("reconciler: view modifiers unchanged, not pushing");
            return Ok(false);
        }

        let now = self.clock.now();
        if let Some(last) = self.last_push_at
            && now - last <= self.loop_guard
        {
            tracing::warn!(
                "reconciler: push within {}ms of the previous one; \
                 existing={:?} update={update:?} new_query=?{new_query}",
                self.loop_guard.num_milliseconds(),
                existing.view_modifiers
            );
            return Err(ReconcileError::PossibleInfiniteLoop {
                window_ms: self.loop_guard.num_milliseconds(),
            });
        }
        self.last_push_at = Some(now);
        self.history.push(new_query);
        Ok(true)
    }

    pub fn save_filter_selections(
        &mut self,
        filters: FilterModifiers,
    ) -> Result<bool, ReconcileError> {
        self.save_view_modifiers(&PartialViewModifiers::filters(filters))
    }

    pub fn save_sort_modifiers(&mut self, sorts: SortModifiers) -> Result<bool, ReconcileError> {
        self.save_view_modifiers(&PartialViewModifiers::sorts(sorts))
    }

    /// Sort by `column`, flipping the direction if it is already active.
    pub fn toggle_sort_on(&mut self, column: SortColumn) -> Result<bool, ReconcileError> {
        self.save_sort_modifiers(self.view_modifiers.sorts.toggled_on(column))
    }

    /// Start a load for `session`. Any result for an earlier load becomes
    /// stale.
    pub fn begin_load(
        &mut self,
        session: &Session,
        refresh: bool,
    ) -> Result<LoadTicket, ReconcileError> {
        let signed_in = session.signed_in().ok_or(ReconcileError::NotSignedIn)?;
        self.generation += 1;
        self.status.kind = RequestStatusKind::Loading;
        tracing::debug!(
            "reconciler: loading (generation {}, refresh={refresh})",
            self.generation
        );
        Ok(LoadTicket {
            generation: self.generation,
            session: signed_in.clone(),
            refresh,
        })
    }

    /// Apply an engine event.
    ///
    /// A fatal failure moves to the error state and is also returned as
    /// [`ReconcileError::Fatal`].
    pub fn handle_event(&mut self, event: Event) -> Result<Applied, ReconcileError> {
        if event.generation() != self.generation {
            tracing::debug!(
                "reconciler: discarding stale response (generation {}, latest {})",
                event.generation(),
                self.generation
            );
            return Ok(Applied::Stale);
        }

        match event {
            Event::PullRequestsFetched { pull_requests, .. } => {
                let count = pull_requests.len();
                self.has_loaded_once = true;
                self.status.kind = RequestStatusKind::Loaded;
                self.status.error_message = None;
                self.status.data.unfiltered_pull_requests = pull_requests;
                self.recompute();
                tracing::debug!(
                    "reconciler: loaded {count} pull requests, {} shown",
                    self.status.data.filtered_pull_requests.len()
                );
                Ok(Applied::Loaded { count })
            }
            Event::FetchFailed { failure, .. } => {
                self.status.kind = RequestStatusKind::Error;
                self.status.error_message =
                    Some(format!("Couldn't fetch pull requests: {}", failure.message));
                tracing::debug!("reconciler: fetch failed: {}", failure.message);
                match failure.kind {
                    FailureKind::Fatal => Err(ReconcileError::Fatal(failure.message)),
                    FailureKind::Unauthorized => Ok(Applied::Failed {
                        sign_in_required: true,
                    }),
                    FailureKind::Other => Ok(Applied::Failed {
                        sign_in_required: false,
                    }),
                }
            }
        }
    }

    fn recompute(&mut self) {
        let filtered = filter_pull_requests(
            &self.status.data.unfiltered_pull_requests,
            Some(&self.view_modifiers.filters),
        );
        self.status.data.filtered_pull_requests =
            sort_pull_requests(&filtered, Some(&self.view_modifiers.sorts));
    }
}
