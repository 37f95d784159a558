use octocrab::Octocrab;
use serde::{Deserialize, Serialize};

use crate::github::retry::{self, SourceError};
use crate::github::types::{MergeableState, ReviewDecision, StatusState};

// ---------------------------------------------------------------------------
// GraphQL query strings
// ---------------------------------------------------------------------------

const PULL_REQUESTS_QUERY: &str = r"
query PullRequests($owner: String!, $name: String!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    pullRequests(states: [OPEN], first: $first, after: $after) {
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        author {
          avatarUrl
          login
          ... on User {
            organizations(first: 10) { nodes { login } }
          }
          ... on EnterpriseUserAccount {
            organizations(first: 10) { nodes { login } }
          }
        }
        closingIssuesReferences(first: 5) {
          nodes {
            labels(first: 10) { nodes { name } }
          }
        }
        commits(last: 1) {
          nodes {
            commit {
              status {
                contexts { state }
              }
            }
          }
        }
        number
        title
        isDraft
        labels(first: 10) { nodes { name } }
        mergeable
        publishedAt
        createdAt
        reviewDecision
        url
      }
    }
  }
}
";

const VIEWER_QUERY: &str = r"
query Viewer {
  viewer {
    login
    organizations(first: 5) { nodes { login } }
  }
}
";

// ---------------------------------------------------------------------------
// Request payload
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GraphQLPayload<V: Serialize> {
    query: &'static str,
    variables: V,
}

#[derive(Serialize)]
struct PullRequestsVariables<'a> {
    owner: &'a str,
    name: &'a str,
    first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<String>,
}

#[derive(Serialize)]
struct NoVariables {}

// ---------------------------------------------------------------------------
// Response types (mirror the GraphQL response shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphQLResponse<D> {
    data: Option<D>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestsData {
    repository: Option<RawRepository>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    #[serde(rename = "pullRequests")]
    pull_requests: RawPullRequestPage,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: RawViewer,
}

/// Pagination info from GraphQL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

/// One page of open pull requests, as the API returned it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPullRequestPage {
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    #[serde(default, deserialize_with = "nullable_nodes")]
    pub nodes: Vec<Option<RawPullRequest>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct Connection<T> {
    #[serde(default, deserialize_with = "nullable_nodes")]
    pub nodes: Vec<Option<T>>,
}

/// GitHub may send `"nodes": null`; treat it like an empty list.
fn nullable_nodes<'de, D, T>(deserializer: D) -> Result<Vec<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default())
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> Connection<T> {
    /// Non-null nodes, in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter().flatten()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPullRequest {
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(rename = "closingIssuesReferences", default)]
    pub closing_issues_references: Option<Connection<RawClosingIssue>>,
    #[serde(default)]
    pub commits: Option<Connection<RawCommitNode>>,
    pub number: u64,
    pub title: String,
    #[serde(rename = "isDraft", default)]
    pub is_draft: bool,
    #[serde(default)]
    pub labels: Option<Connection<RawLabel>>,
    #[serde(default)]
    pub mergeable: Option<MergeableState>,
    #[serde(rename = "publishedAt", default)]
    pub published_at: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "reviewDecision", default)]
    pub review_decision: Option<ReviewDecision>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthor {
    pub login: String,
    #[serde(rename = "avatarUrl", default)]
    pub avatar_url: String,
    /// Absent for bots and other non-user actors.
    #[serde(default)]
    pub organizations: Option<Connection<RawLogin>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLogin {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawClosingIssue {
    #[serde(default)]
    pub labels: Option<Connection<RawLabel>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitNode {
    pub commit: RawCommit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommit {
    #[serde(default)]
    pub status: Option<RawCommitStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitStatus {
    #[serde(default)]
    pub contexts: Vec<RawStatusContext>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStatusContext {
    pub state: StatusState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawViewer {
    pub login: String,
    #[serde(default)]
    pub organizations: Option<Connection<RawLogin>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

fn check_errors<D>(response: GraphQLResponse<D>) -> Result<D, SourceError> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        return Err(retry::classify_message(format!(
            "GraphQL errors: {}",
            messages.join("; ")
        )));
    }
    response.data.ok_or_else(|| SourceError::Api {
        message: "GraphQL response missing data field".to_owned(),
    })
}

/// Execute the `PullRequests` GraphQL query for a single page of open pull
/// requests in `owner/name`.
pub async fn fetch_pull_requests_page(
    octocrab: &Octocrab,
    owner: &str,
    name: &str,
    first: u32,
    after: Option<String>,
) -> Result<RawPullRequestPage, SourceError> {
    let payload = GraphQLPayload {
        query: PULL_REQUESTS_QUERY,
        variables: PullRequestsVariables {
            owner,
            name,
            first: first.min(100),
            after,
        },
    };

    let response: GraphQLResponse<PullRequestsData> = octocrab
        .graphql(&payload)
        .await
        .map_err(|e| retry::classify(&e))?;

    let data = check_errors(response)?;
    let repository = data.repository.ok_or_else(|| SourceError::Api {
        message: format!("repository {owner}/{name} not found"),
    })?;

    tracing::debug!(
        "fetched page of {} pull requests (has_next_page={})",
        repository.pull_requests.nodes.len(),
        repository.pull_requests.page_info.has_next_page
    );
    Ok(repository.pull_requests)
}

/// Fetch the authenticated user and the organizations they belong to.
pub async fn fetch_viewer(octocrab: &Octocrab) -> Result<RawViewer, SourceError> {
    let payload = GraphQLPayload {
        query: VIEWER_QUERY,
        variables: NoVariables {},
    };

    let response: GraphQLResponse<ViewerData> = octocrab
        .graphql(&payload)
        .await
        .map_err(|e| retry::classify(&e))?;

    Ok(check_errors(response)?.viewer)
}
