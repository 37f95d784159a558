// Pedantic: suppress noise for internal crate code.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod app;
pub mod cache;
pub mod clock;
pub mod config;
pub mod engine;
pub mod fetcher;
pub mod filter;
pub mod github;
pub mod history;
pub mod query;
pub mod reconciler;
pub mod session;
pub mod sort;
pub mod storage;
pub mod types;
pub mod util;
pub mod views;
