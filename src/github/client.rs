use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use octocrab::Octocrab;

use crate::cache::RequestParams;
use crate::fetcher::PullRequestSource;
use crate::github::graphql::{self, RawPullRequestPage, RawViewer};
use crate::github::retry::SourceError;

/// A GitHub API client that builds one Octocrab instance per access token
/// and reads the open pull requests of a single repository.
pub struct GitHubClient {
    host: String,
    owner: String,
    repo: String,
    page_size: u32,
    base_uri: Option<String>,
    instances: Mutex<HashMap<String, Arc<Octocrab>>>,
}

impl GitHubClient {
    pub fn new(
        host: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            host: host.into(),
            owner: owner.into(),
            repo: repo.into(),
            page_size,
            base_uri: None,
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Send every request to `uri` instead of the host's API endpoint.
    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Get or create an Octocrab instance authenticated with `token`.
    pub fn octocrab_for(&self, token: &str) -> Result<Arc<Octocrab>> {
        let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = instances.get(token) {
            return Ok(Arc::clone(instance));
        }

        let base_uri = match (&self.base_uri, self.host.as_str()) {
            (Some(uri), _) => Some(uri.clone()),
            (None, "github.com") => None,
            (None, host) => Some(format!("https://{host}/api/v3")),
        };

        let mut builder = Octocrab::builder().personal_token(token.to_owned());
        if let Some(uri) = base_uri {
            builder = builder.base_uri(uri).context("setting GitHub base URI")?;
        }

        let instance = Arc::new(builder.build().context("building octocrab instance")?);
        instances.insert(token.to_owned(), Arc::clone(&instance));
        Ok(instance)
    }

    /// Look up the user the token belongs to.
    pub async fn fetch_viewer(&self, token: &str) -> Result<RawViewer, SourceError> {
        let octocrab = self.octocrab_for(token).map_err(api_error)?;
        graphql::fetch_viewer(&octocrab).await
    }
}

fn api_error(e: anyhow::Error) -> SourceError {
    SourceError::Api {
        message: format!("{e:#}"),
    }
}

impl PullRequestSource for GitHubClient {
    async fn fetch_page(
        &self,
        params: &RequestParams,
        after: Option<String>,
    ) -> Result<RawPullRequestPage, SourceError> {
        let octocrab = self.octocrab_for(&params.access_token).map_err(api_error)?;
        graphql::fetch_pull_requests_page(&octocrab, &self.owner, &self.repo, self.page_size, after)
            .await
    }
}
