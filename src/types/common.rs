use serde::{Deserialize, Serialize};

/// Login used when GitHub returns no author (the account was deleted).
pub const GHOST_LOGIN: &str = "ghost";

/// Avatar GitHub serves for the `ghost` placeholder account.
pub const GHOST_AVATAR_URL: &str = "https://avatars.githubusercontent.com/u/10137?v=4";

// ---------------------------------------------------------------------------
// Common supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestAuthor {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    /// Logins of the organizations the author publicly belongs to.
    #[serde(default)]
    pub org_logins: Vec<String>,
}

impl PullRequestAuthor {
    /// Placeholder identity for pull requests whose author no longer exists.
    pub fn ghost() -> Self {
        Self {
            login: GHOST_LOGIN.to_owned(),
            avatar_url: GHOST_AVATAR_URL.to_owned(),
            org_logins: Vec::new(),
        }
    }

    pub fn is_member_of(&self, org: &str) -> bool {
        self.org_logins.iter().any(|o| o == org)
    }

    pub fn shares_org_with(&self, org_logins: &[String]) -> bool {
        self.org_logins.iter().any(|o| org_logins.contains(o))
    }
}
