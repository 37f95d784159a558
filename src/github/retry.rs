//! Classification of upstream failures.
//!
//! GitHub signals trouble through:
//! - GraphQL `errors` with "Something went wrong while executing your query.
//!   This may be the result of a timeout" (retryable)
//! - truncated response bodies that fail JSON parsing (retryable)
//! - HTTP 401 / "Bad credentials" (sign the user out)
//! - HTTP 403/429 or "rate limit" messages

use thiserror::Error;

/// Why a single page request to the upstream API failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{message}")]
    Transient { message: String },
    #[error("authentication failed: {message}")]
    Unauthorized { message: String },
    #[error("{message}")]
    RateLimited { message: String },
    #[error("{message}")]
    Api { message: String },
}

impl SourceError {
    /// Only transient errors are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

const TRANSIENT_SIGNATURES: &[&str] = &[
    "unexpected end of json input",
    "eof while parsing",
    "something went wrong while executing your query. this may be the result of a timeout",
];

pub(crate) fn is_transient_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    TRANSIENT_SIGNATURES.iter().any(|sig| lower.contains(sig))
}

pub(crate) fn is_unauthorized_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("bad credentials") || lower.contains("status code: 401")
}

pub(crate) fn is_rate_limited_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("rate limit")
        || lower.contains("status code: 429")
        || lower.contains("status code: 403")
}

/// Format a user-friendly message for a rate-limit error.
fn format_rate_limit_message(msg: &str) -> String {
    if msg.to_lowercase().contains("secondary rate limit") {
        "Secondary rate limit hit. Wait a moment, then refresh.".to_owned()
    } else {
        "API rate limit exceeded. Refresh once the limit resets.".to_owned()
    }
}

/// Map an upstream failure message onto the error taxonomy.
pub fn classify_message(message: String) -> SourceError {
    if is_transient_message(&message) {
        SourceError::Transient { message }
    } else if is_unauthorized_message(&message) {
        SourceError::Unauthorized { message }
    } else if is_rate_limited_message(&message) {
        SourceError::RateLimited {
            message: format_rate_limit_message(&message),
        }
    } else {
        SourceError::Api { message }
    }
}

/// Classify an error by its full `source()` chain.
pub fn classify(error: &(dyn std::error::Error + 'static)) -> SourceError {
    let mut message = error.to_string();
    let mut current = error.source();
    while let Some(inner) = current {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        current = inner.source();
    }
    classify_message(message)
}
