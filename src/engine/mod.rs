// engine module: backend that owns the async runtime and the fetcher

pub mod github;
mod interface;
pub mod stub;

pub use github::GitHubEngine;
pub use interface::{Engine, EngineHandle, Event, FailureKind, FetchFailure, Request};
pub use stub::StubEngine;
