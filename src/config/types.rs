use std::path::PathBuf;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::fetcher::FetchSettings;
use crate::github::DEFAULT_CORE_ORG;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub github: GitHubConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub view: ViewConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub host: String,
    pub owner: String,
    pub repo: String,
    /// Nodes per GraphQL page. GitHub caps this at 100.
    pub page_size: u32,
    /// Organization whose members count as core contributors.
    pub core_org: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_owned(),
            owner: "MetaMask".to_owned(),
            repo: "metamask-extension".to_owned(),
            page_size: 100,
            core_org: DEFAULT_CORE_ORG.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub debounce_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            debounce_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_age_minutes: u32,
    /// Captures taken before this instant are never served.
    pub expire_before: Option<DateTime<Utc>>,
    /// Defaults to `$XDG_CACHE_HOME/pr-dashboard` or `~/.cache/pr-dashboard`.
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_minutes: 60,
            expire_before: None,
            dir: None,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.max_age_minutes))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub loop_guard_ms: u64,
    /// `"relative"` or a chrono format string such as `"%Y-%m-%d"`.
    pub date_format: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            loop_guard_ms: 200,
            date_format: "relative".to_owned(),
        }
    }
}

fn millis(ms: u64) -> TimeDelta {
    TimeDelta::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}

impl ViewConfig {
    pub fn loop_guard(&self) -> TimeDelta {
        millis(self.loop_guard_ms)
    }
}

impl AppConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            max_retries: self.fetch.max_retries,
            debounce: millis(self.fetch.debounce_ms),
            core_org: self.github.core_org.clone(),
        }
    }
}
