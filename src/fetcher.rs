use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::cache::{CacheStore, RequestParams};
use crate::clock::Clock;
use crate::github::build_pull_request;
use crate::github::graphql::RawPullRequestPage;
use crate::github::retry::SourceError;
use crate::types::{PullRequest, SignedInSession};

/// Upstream that serves pages of raw pull requests.
pub trait PullRequestSource: Send + Sync {
    fn fetch_page(
        &self,
        params: &RequestParams,
        after: Option<String>,
    ) -> impl Future<Output = Result<RawPullRequestPage, SourceError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(
        "possible infinite loop: pull requests were requested from the GitHub API twice \
         within {window_ms}ms; this would exhaust the rate limit"
    )]
    PossibleInfiniteLoop { window_ms: i64 },
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Extra attempts per page after a transient failure.
    pub max_retries: u32,
    /// Minimum spacing between two API fetches.
    pub debounce: TimeDelta,
    pub core_org: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            debounce: TimeDelta::milliseconds(100),
            core_org: crate::github::DEFAULT_CORE_ORG.to_owned(),
        }
    }
}

/// Cache-first, paginated pull request retrieval.
pub struct PullRequestFetcher<S> {
    source: S,
    cache: Option<CacheStore>,
    clock: Arc<dyn Clock>,
    settings: FetchSettings,
    last_fetch_started_at: Option<DateTime<Utc>>,
}

impl<S: PullRequestSource> PullRequestFetcher<S> {
    pub fn new(
        source: S,
        cache: Option<CacheStore>,
        clock: Arc<dyn Clock>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            source,
            cache,
            clock,
            settings,
            last_fetch_started_at: None,
        }
    }

    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }

    /// Return the open, non-draft pull requests visible to `session`.
    ///
    /// A capture older than `expires_before` is ignored.
    pub async fn fetch(
        &mut self,
        session: &SignedInSession,
        expires_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<PullRequest>, FetchError> {
        let params = RequestParams {
            access_token: session.access_token.clone(),
        };

        if let Some(cache) = &self.cache
            && let Some(capture) = cache.get(&params, expires_before)
        {
            return Ok(capture.pull_requests);
        }

        self.check_debounce()?;

        let mut nodes = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.fetch_page_with_retry(&params, cursor.take()).await?;
            nodes.extend(page.nodes.into_iter().flatten());
            match page.page_info {
                info if info.has_next_page && info.end_cursor.is_some() => {
                    cursor = info.end_cursor;
                }
                _ => break,
            }
        }

        let pull_requests: Vec<PullRequest> = nodes
            .into_iter()
            .map(|raw| build_pull_request(raw, &session.user, &self.settings.core_org))
            .filter(|pr| !pr.is_draft)
            .collect();
        tracing::debug!("fetched {} non-draft pull requests", pull_requests.len());

        if let Some(cache) = &self.cache
            && let Err(e) = cache.put(&params, &pull_requests, self.clock.now())
        {
            tracing::warn!("failed to store pull request capture: {e}");
        }

        Ok(pull_requests)
    }

    fn check_debounce(&mut self) -> Result<(), FetchError> {
        let now = self.clock.now();
        if let Some(last) = self.last_fetch_started_at
            && now - last <= self.settings.debounce
        {
            return Err(FetchError::PossibleInfiniteLoop {
                window_ms: self.settings.debounce.num_milliseconds(),
            });
        }
        self.last_fetch_started_at = Some(now);
        Ok(())
    }

    async fn fetch_page_with_retry(
        &self,
        params: &RequestParams,
        after: Option<String>,
    ) -> Result<RawPullRequestPage, SourceError> {
        let mut retries = 0;
        loop {
            match self.source.fetch_page(params, after.clone()).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && retries < self.settings.max_retries => {
                    retries += 1;
                    tracing::info!(
                        "transient error fetching page, retrying ({retries}/{}): {e}",
                        self.settings.max_retries
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}
