use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::storage::{Storage, StorageError};
use crate::types::PullRequest;

/// Storage key of the single pull request capture.
pub const CACHE_KEY: &str = "fetchPullRequestsRequest";

/// Parameters that produced a capture. A capture is only served back for
/// exactly the same parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    pub access_token: String,
}

impl std::fmt::Debug for RequestParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestParams")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// A cached snapshot of fetched pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestsCapture {
    pub request_params: RequestParams,
    pub pull_requests: Vec<PullRequest>,
    pub request_time: DateTime<Utc>,
}

/// Persists the latest capture and decides whether it is still valid.
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    max_age: TimeDelta,
    /// Captures created before this instant are never served.
    expire_before: Option<DateTime<Utc>>,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, max_age: TimeDelta) -> Self {
        Self {
            storage,
            clock,
            max_age,
            expire_before: None,
        }
    }

    pub fn with_expire_before(mut self, expire_before: Option<DateTime<Utc>>) -> Self {
        self.expire_before = expire_before;
        self
    }

    /// Return the stored capture if it matches `params`, is within the max
    /// age and was created no earlier than `expires_before`.
    ///
    /// Missing, unreadable or corrupt records are all cache misses.
    pub fn get(
        &self,
        params: &RequestParams,
        expires_before: Option<DateTime<Utc>>,
    ) -> Option<PullRequestsCapture> {
        let raw = match self.storage.get_item(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("cache miss: no capture stored");
                return None;
            }
            Err(e) => {
                tracing::warn!("cache miss: reading capture failed: {e}");
                return None;
            }
        };

        let capture: PullRequestsCapture = match serde_json::from_str(&raw) {
            Ok(capture) => capture,
            Err(e) => {
                tracing::warn!("cache miss: capture is corrupt: {e}");
                return None;
            }
        };

        if capture.request_params != *params {
            tracing::debug!("cache miss: request params differ");
            return None;
        }

        let boundary = match (self.expire_before, expires_before) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        if let Some(boundary) = boundary
            && capture.request_time < boundary
        {
            tracing::debug!(
                "cache miss: capture from {} predates boundary {boundary}",
                capture.request_time
            );
            return None;
        }

        let age = self.clock.now() - capture.request_time;
        if age > self.max_age {
            tracing::debug!("cache miss: capture is {}s old", age.num_seconds());
            return None;
        }

        tracing::debug!(
            "cache hit: {} pull requests from {}",
            capture.pull_requests.len(),
            capture.request_time
        );
        Some(capture)
    }

    /// Overwrite the stored capture.
    pub fn put(
        &self,
        params: &RequestParams,
        pull_requests: &[PullRequest],
        time: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let capture = PullRequestsCapture {
            request_params: params.clone(),
            pull_requests: pull_requests.to_vec(),
            request_time: time,
        };
        let json = serde_json::to_string(&capture).map_err(|source| StorageError::Serialize {
            key: CACHE_KEY.to_owned(),
            source,
        })?;
        self.storage.set_item(CACHE_KEY, &json)
    }

    /// Boundary to pass as `expires_before` to force the next `get` to miss.
    /// Nothing is deleted.
    pub fn invalidate_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
