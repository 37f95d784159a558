pub mod auth;
pub mod builder;
pub mod client;
pub mod graphql;
pub mod retry;
pub mod types;

pub use builder::{DEFAULT_CORE_ORG, build_pull_request};
pub use client::GitHubClient;
pub use retry::SourceError;
