use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of the signed-in GitHub user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedInUser {
    pub login: String,
    #[serde(default)]
    pub org_logins: Vec<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedInSession {
    pub access_token: String,
    pub user: SignedInUser,
}

// Keep the token out of logs.
impl fmt::Debug for SignedInSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedInSession")
            .field("access_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Session {
    #[default]
    SignedOut,
    SignedIn(SignedInSession),
}

impl Session {
    pub fn signed_in(&self) -> Option<&SignedInSession> {
        match self {
            Self::SignedIn(s) => Some(s),
            Self::SignedOut => None,
        }
    }
}
