use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::github::GitHubClient;
use crate::storage::{Storage, StorageError};
use crate::types::{Session, SignedInSession, SignedInUser};

/// Storage key of the persisted session.
pub const SESSION_KEY: &str = "session/v2";

/// Persists who is signed in.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The stored session. A missing or unreadable record means signed out.
    pub fn load(&self) -> Session {
        match self.storage.get_item(SESSION_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("ignoring corrupt session record: {e}");
                Session::SignedOut
            }),
            Ok(None) => Session::SignedOut,
            Err(e) => {
                tracing::warn!("reading session failed: {e}");
                Session::SignedOut
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        let json = serde_json::to_string(session).map_err(|source| StorageError::Serialize {
            key: SESSION_KEY.to_owned(),
            source,
        })?;
        self.storage.set_item(SESSION_KEY, &json)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(SESSION_KEY)
    }

    /// Look up the token's owner and persist a signed-in session.
    ///
    /// A rejected token clears any stored session.
    pub async fn sign_in(
        &self,
        client: &GitHubClient,
        access_token: String,
    ) -> Result<SignedInSession> {
        let viewer = match client.fetch_viewer(&access_token).await {
            Ok(viewer) => viewer,
            Err(e) if e.is_unauthorized() => {
                self.clear().context("clearing rejected session")?;
                bail!("sign-in failed: GitHub rejected the token ({e})");
            }
            Err(e) => return Err(e).context("looking up the signed-in user"),
        };

        let session = SignedInSession {
            access_token,
            user: SignedInUser {
                org_logins: viewer
                    .organizations
                    .map(|orgs| orgs.iter().map(|o| o.login.clone()).collect())
                    .unwrap_or_default(),
                login: viewer.login,
            },
        };
        self.save(&Session::SignedIn(session.clone()))
            .context("saving session")?;
        tracing::info!("signed in as {}", session.user.login);
        Ok(session)
    }
}
