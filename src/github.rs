use std::{fmt, future::Future, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::debug;

use crate::types::{BranchName, PullRequestRef, Repo, StatusState};

/// Environment variables checked, in order, for a GitHub token.
pub const TOKEN_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

pub const TOKEN_SETTINGS_URL: &str = "https://github.com/settings/tokens";

/// Raised when no GitHub token is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError;

impl TokenError {
    pub fn remediation(&self) -> Vec<String> {
        vec![
            format!("You can generate one on {TOKEN_SETTINGS_URL}"),
            "If your organization has enabled SSO for its repositories, you will need to click on 'Enable SSO'".to_string(),
        ]
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No GITHUB_TOKEN environment variable found")
    }
}

impl std::error::Error for TokenError {}

/// Looks up a token through `lookup`, ignoring blank values.
pub fn find_github_token<F>(lookup: F) -> Result<String, TokenError>
where
    F: Fn(&str) -> Option<String>,
{
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
        .ok_or(TokenError)
}

pub fn get_github_token() -> Result<String, TokenError> {
    find_github_token(|key| std::env::var(key).ok())
}

/// Diagnostic for a failed GitHub call, shown to the user instead of
/// aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub message: String,
    /// Remediation page supplied by the API, if any.
    pub documentation_url: Option<String>,
    /// Full error chain, printed under `--debug`.
    pub detail: String,
}

impl ApiFailure {
    pub fn from_error(error: &anyhow::Error) -> Self {
        let documentation_url = error.chain().find_map(|cause| {
            match cause.downcast_ref::<octocrab::Error>() {
                Some(octocrab::Error::GitHub { source, .. }) => source.documentation_url.clone(),
                _ => None,
            }
        });
        Self {
            message: format!("{error:#}"),
            documentation_url,
            detail: format!("{error:?}"),
        }
    }

    /// Hints printed after every API failure, since most of them come
    /// down to token scope.
    pub fn hints(&self) -> Vec<String> {
        vec![
            "If accessing a private repository, make sure you have a GITHUB_TOKEN environment variable".to_string(),
            format!("You can generate one on {TOKEN_SETTINGS_URL}"),
            "If your organization has enabled SSO, you will need to click on 'Enable SSO'".to_string(),
        ]
    }
}

/// One entry of the combined status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitStatus {
    pub state: StatusState,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
}

/// Response of `GET /repos/{owner}/{repo}/commits/{ref}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct CombinedStatus {
    pub state: StatusState,
    #[serde(default)]
    pub statuses: Vec<CommitStatus>,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct BranchDetails {
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct IssueSearchItem {
    html_url: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct IssueSearchResults {
    items: Vec<IssueSearchItem>,
}

/// The hosting-service calls the watcher depends on.
#[async_trait]
pub trait Forge {
    fn repo(&self) -> &Repo;

    async fn combined_status(&self, branch: &BranchName) -> Result<CombinedStatus>;

    async fn branch_head_sha(&self, branch: &BranchName) -> Result<String>;

    /// Runs an issue search and returns pull requests in result order.
    async fn search_pull_requests(&self, query: &str) -> Result<Vec<PullRequestRef>>;
}

/// [`Forge`] talking to the GitHub REST API for a single repository.
pub struct GitHub {
    client: Octocrab,
    repo: Repo,
    request_timeout: Duration,
}

impl GitHub {
    /// Creates an authenticated client bound to `repo`.
    pub fn connect(token: String, repo: Repo, request_timeout: Duration) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token)
            .build()
            .context("Failed to create GitHub client")?;
        Ok(Self {
            client,
            repo,
            request_timeout,
        })
    }

    fn route(&self, path: &str) -> String {
        format!("/repos/{}/{}/{}", self.repo.owner(), self.repo.name(), path)
    }

    #[cfg(test)]
    fn with_base_uri(base_uri: &str, repo: Repo) -> Result<Self> {
        let client = Octocrab::builder()
            .base_uri(base_uri)?
            .personal_token("test-token".to_string())
            .build()?;
        Ok(Self {
            client,
            repo,
            request_timeout: Duration::from_secs(5),
        })
    }

    async fn with_timeout<T, Fut>(&self, what: &str, request: Fut) -> Result<T>
    where
        Fut: Future<Output = octocrab::Result<T>> + Send,
    {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(response) => Ok(response?),
            Err(_) => anyhow::bail!(
                "GitHub did not answer the {} request within {}s",
                what,
                self.request_timeout.as_secs()
            ),
        }
    }
}

/// Percent-encodes a branch name for use as a route segment. Slashes are
/// kept, GitHub accepts them unescaped in ref paths.
fn encode_ref(branch: &BranchName) -> String {
    branch
        .as_str()
        .split('/')
        .map(|part| url::form_urlencoded::byte_serialize(part.as_bytes()).collect::<String>())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl Forge for GitHub {
    fn repo(&self) -> &Repo {
        &self.repo
    }

    async fn combined_status(&self, branch: &BranchName) -> Result<CombinedStatus> {
        let route = self.route(&format!("commits/{}/status", encode_ref(branch)));
        debug!("GET {route}");
        self.with_timeout("combined status", self.client.get(route, None::<&()>))
            .await
    }

    async fn branch_head_sha(&self, branch: &BranchName) -> Result<String> {
        let route = self.route(&format!("branches/{}", encode_ref(branch)));
        debug!("GET {route}");
        let details: BranchDetails = self
            .with_timeout("branch", self.client.get(route, None::<&()>))
            .await?;
        Ok(details.commit.sha)
    }

    async fn search_pull_requests(&self, query: &str) -> Result<Vec<PullRequestRef>> {
        debug!("searching issues: {query}");
        let params = serde_json::json!({ "q": query });
        let results: IssueSearchResults = self
            .with_timeout("search", self.client.get("/search/issues", Some(&params)))
            .await?;
        Ok(results
            .items
            .into_iter()
            .map(|item| PullRequestRef {
                url: item.html_url,
                title: item.title,
            })
            .collect())
    }
}
