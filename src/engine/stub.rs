use tokio::sync::mpsc::UnboundedReceiver;

use crate::types::PullRequest;

use super::interface::{Engine, EngineHandle, Event, FetchFailure, Request};

/// A stub engine that serves pre-loaded fixture data without any network calls.
///
/// Useful for integration tests and demos that must not require a token.
/// When `failure` is set every fetch fails with it instead.
#[derive(Default)]
pub struct StubEngine {
    pub prs: Vec<PullRequest>,
    pub failure: Option<FetchFailure>,
}

impl Engine for StubEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        std::thread::spawn(move || {
            match tokio::runtime::Builder::new_current_thread().build() {
                Ok(rt) => rt.block_on(self.run_loop(rx)),
                Err(e) => tracing::error!("stub engine: tokio runtime init failed: {e}"),
            }
        });
        EngineHandle::new(tx)
    }
}

impl StubEngine {
    async fn run_loop(self, mut rx: UnboundedReceiver<Request>) {
        while let Some(req) = rx.recv().await {
            match req {
                Request::FetchPullRequests {
                    generation,
                    reply_tx,
                    ..
                } => {
                    let event = match &self.failure {
                        Some(failure) => Event::FetchFailed {
                            generation,
                            failure: failure.clone(),
                        },
                        None => Event::PullRequestsFetched {
                            generation,
                            pull_requests: self
                                .prs
                                .iter()
                                .filter(|pr| !pr.is_draft)
                                .cloned()
                                .collect(),
                        },
                    };
                    let _ = reply_tx.send(event);
                }
                Request::Shutdown => break,
            }
        }
    }
}
