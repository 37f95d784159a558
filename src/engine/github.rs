use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cache::CacheStore;
use crate::clock::{Clock, SystemClock};
use crate::config::types::AppConfig;
use crate::fetcher::PullRequestFetcher;
use crate::github::GitHubClient;
use crate::storage::Storage;

use super::interface::{Engine, EngineHandle, Event, FetchFailure, Request};

/// The real GitHub backend engine.
pub struct GitHubEngine {
    config: AppConfig,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    base_uri: Option<String>,
}

impl GitHubEngine {
    pub fn new(config: AppConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            config,
            storage,
            clock: Arc::new(SystemClock),
            base_uri: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Talk to `uri` instead of the configured host.
    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    fn build_fetcher(&self) -> PullRequestFetcher<GitHubClient> {
        let github = &self.config.github;
        let mut client =
            GitHubClient::new(&github.host, &github.owner, &github.repo, github.page_size);
        if let Some(uri) = &self.base_uri {
            client = client.with_base_uri(uri);
        }

        let cache = self.config.cache.enabled.then(|| {
            CacheStore::new(
                Arc::clone(&self.storage),
                Arc::clone(&self.clock),
                self.config.cache.max_age(),
            )
            .with_expire_before(self.config.cache.expire_before)
        });

        PullRequestFetcher::new(
            client,
            cache,
            Arc::clone(&self.clock),
            self.config.fetch_settings(),
        )
    }
}

impl Engine for GitHubEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        let handle = EngineHandle::new(tx);
        let spawned = std::thread::Builder::new()
            .name("pr-engine".to_owned())
            .spawn(move || match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(self.run_loop(rx)),
                Err(e) => tracing::error!("engine: tokio runtime init failed: {e}"),
            });
        if let Err(e) = spawned {
            tracing::error!("engine: failed to spawn thread: {e}");
        }
        handle
    }
}

impl GitHubEngine {
    async fn run_loop(self, mut rx: UnboundedReceiver<Request>) {
        let mut fetcher = self.build_fetcher();
        // Captures older than the latest refresh are never served again.
        let mut expires_before: Option<DateTime<Utc>> = None;

        loop {
            match rx.recv().await {
                None | Some(Request::Shutdown) => {
                    tracing::debug!("engine: shutting down");
                    break;
                }
                Some(req) => {
                    handle_request(req, &mut fetcher, &mut expires_before, self.clock.as_ref())
                        .await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request dispatch
// ---------------------------------------------------------------------------

async fn handle_request(
    req: Request,
    fetcher: &mut PullRequestFetcher<GitHubClient>,
    expires_before: &mut Option<DateTime<Utc>>,
    clock: &dyn Clock,
) {
    tracing::debug!("engine: received request");
    match req {
        Request::FetchPullRequests {
            generation,
            session,
            refresh,
            reply_tx,
        } => {
            if refresh {
                let boundary = fetcher
                    .cache()
                    .map_or_else(|| clock.now(), CacheStore::invalidate_now);
                *expires_before = Some(boundary);
            }

            match fetcher.fetch(&session, *expires_before).await {
                Ok(pull_requests) => {
                    tracing::debug!(
                        "engine: sending PullRequestsFetched[{generation}] count={}",
                        pull_requests.len()
                    );
                    let _ = reply_tx.send(Event::PullRequestsFetched {
                        generation,
                        pull_requests,
                    });
                }
                Err(e) => {
                    tracing::debug!("engine: FetchPullRequests[{generation}] error: {e}");
                    let _ = reply_tx.send(Event::FetchFailed {
                        generation,
                        failure: FetchFailure::from(&e),
                    });
                }
            }
        }
        Request::Shutdown => {}
    }
}
