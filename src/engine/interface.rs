use std::sync::mpsc::Sender;

use crate::fetcher::FetchError;
use crate::types::{PullRequest, SignedInSession};

/// Handle to the backend engine held by the UI layer.
///
/// Cheaply cloneable. When the last handle is dropped the sender channel
/// closes, signalling the engine to shut down.
#[derive(Clone)]
pub struct EngineHandle {
    tx: tokio::sync::mpsc::UnboundedSender<Request>,
}

impl EngineHandle {
    pub(super) fn new(tx: tokio::sync::mpsc::UnboundedSender<Request>) -> Self {
        Self { tx }
    }

    /// Send a request to the engine. Non-blocking, returns immediately.
    pub fn send(&self, req: Request) {
        // Ignore errors: if the receiver is gone the engine has already shut down.
        let _ = self.tx.send(req);
    }
}

/// Trait implemented by both `GitHubEngine` and `StubEngine`.
pub trait Engine: Send + 'static {
    fn start(self) -> EngineHandle;
}

/// All operations the UI layer can send to the engine.
pub enum Request {
    /// Load the open pull requests for `session`.
    FetchPullRequests {
        generation: u64,
        session: SignedInSession,
        /// Ignore any capture taken before this request.
        refresh: bool,
        reply_tx: Sender<Event>,
    },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A fetch-storm guard tripped. Not recoverable by retrying.
    Fatal,
    /// The token was rejected; the user must sign in again.
    Unauthorized,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&FetchError> for FetchFailure {
    fn from(e: &FetchError) -> Self {
        let kind = match e {
            FetchError::PossibleInfiniteLoop { .. } => FailureKind::Fatal,
            FetchError::Source(source) if source.is_unauthorized() => FailureKind::Unauthorized,
            FetchError::Source(_) => FailureKind::Other,
        };
        Self {
            kind,
            message: e.to_string(),
        }
    }
}

/// All events the engine can push back to the UI.
#[derive(Debug, Clone)]
pub enum Event {
    PullRequestsFetched {
        generation: u64,
        pull_requests: Vec<PullRequest>,
    },
    FetchFailed {
        generation: u64,
        failure: FetchFailure,
    },
}

impl Event {
    pub fn generation(&self) -> u64 {
        match self {
            Self::PullRequestsFetched { generation, .. } | Self::FetchFailed { generation, .. } => {
                *generation
            }
        }
    }
}
