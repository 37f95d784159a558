use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::types::AppConfig;

const APP_DIR: &str = "pr-dashboard";

/// Discover and load the app config.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `$PR_DASHBOARD_CONFIG` environment variable
/// 3. `$XDG_CONFIG_HOME/pr-dashboard/config.toml`
/// 4. `~/.config/pr-dashboard/config.toml`
///
/// With none of these present the built-in defaults are used.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(),
    };

    let Some(path) = path else {
        tracing::debug!("no config file found, using defaults");
        return Ok(AppConfig::default());
    };

    let contents =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML from {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}

fn find_config() -> Option<PathBuf> {
    // $PR_DASHBOARD_CONFIG
    if let Ok(path) = std::env::var("PR_DASHBOARD_CONFIG") {
        let p = PathBuf::from(&path);
        if p.is_file() {
            return Some(p);
        }
    }

    // $XDG_CONFIG_HOME/pr-dashboard/config.toml
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let p = PathBuf::from(xdg).join(APP_DIR).join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // ~/.config/pr-dashboard/config.toml
    if let Some(home) = dirs_fallback() {
        let p = home.join(".config").join(APP_DIR).join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    None
}

/// Directory holding the session and the pull request cache.
pub fn storage_dir(config: &AppConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.cache.dir {
        return Ok(expand_tilde(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME")
        && !xdg.is_empty()
    {
        return Ok(PathBuf::from(xdg).join(APP_DIR));
    }
    let home = dirs_fallback().context("HOME is not set; configure [cache] dir")?;
    Ok(home.join(".cache").join(APP_DIR))
}

fn dirs_fallback() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs_fallback()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let mut config = AppConfig::default();
        config.cache.dir = Some(PathBuf::from("/var/tmp/prd"));
        assert_eq!(storage_dir(&config).unwrap(), PathBuf::from("/var/tmp/prd"));
    }

    #[test]
    fn tilde_is_expanded() {
        if let Some(home) = dirs_fallback() {
            assert_eq!(expand_tilde(Path::new("~/x/y")), home.join("x/y"));
        }
        assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
    }
}
