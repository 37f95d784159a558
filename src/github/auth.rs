use std::process::Command;

use anyhow::{Context, Result, bail};

/// Where a personal access token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Argument,
    GhCli,
    Env(&'static str),
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Argument => f.write_str("--token"),
            Self::GhCli => f.write_str("gh auth token"),
            Self::Env(name) => f.write_str(name),
        }
    }
}

pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

impl std::fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve the token to sign in with.
///
/// Priority:
/// 1. an explicit token (from `login --token`)
/// 2. `GH_TOKEN` environment variable
/// 3. `GITHUB_TOKEN` environment variable
/// 4. `gh auth token --hostname {host}` (gh CLI)
pub fn resolve_token(host: &str, explicit: Option<&str>) -> Result<ResolvedToken> {
    if let Some(token) = explicit.map(str::trim)
        && !token.is_empty()
    {
        return Ok(ResolvedToken {
            token: token.to_owned(),
            source: TokenSource::Argument,
        });
    }

    for name in ["GH_TOKEN", "GITHUB_TOKEN"] {
        if let Ok(token) = std::env::var(name)
            && !token.is_empty()
        {
            return Ok(ResolvedToken {
                token,
                source: TokenSource::Env(name),
            });
        }
    }

    match token_from_gh_cli(host) {
        Ok(token) => Ok(ResolvedToken {
            token,
            source: TokenSource::GhCli,
        }),
        Err(e) => {
            tracing::debug!("gh CLI token lookup failed: {e:#}");
            bail!(
                "no GitHub token found for host \"{host}\". \
                 Pass --token, set GH_TOKEN / GITHUB_TOKEN, or run `gh auth login`."
            )
        }
    }
}

fn token_from_gh_cli(host: &str) -> Result<String> {
    let output = Command::new("gh")
        .args(["auth", "token", "--hostname", host])
        .output()
        .context("failed to run `gh auth token`")?;

    if !output.status.success() {
        bail!("gh auth token exited with non-zero status");
    }

    let token = String::from_utf8(output.stdout)
        .context("gh auth token produced non-UTF-8 output")?
        .trim()
        .to_owned();

    if token.is_empty() {
        bail!("gh auth token returned empty string");
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_token_wins() {
        let resolved = resolve_token("github.com", Some("  ghp_abc \n")).unwrap();
        assert_eq!(resolved.token, "ghp_abc");
        assert_eq!(resolved.source, TokenSource::Argument);
    }

    #[test]
    fn debug_redacts_token() {
        let resolved = ResolvedToken {
            token: "ghp_secret".to_owned(),
            source: TokenSource::GhCli,
        };
        assert!(!format!("{resolved:?}").contains("ghp_secret"));
    }
}
