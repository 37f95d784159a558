pub mod prs;

pub use prs::{RenderOptions, render_pull_requests};
