use std::{fmt, time::Duration};

use serde::Deserialize;

/// Default period between two status polls in watch mode.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default upper bound for a single GitHub request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote used when none is given on the command line.
pub const DEFAULT_REMOTE: &str = "origin";

/// Combined CI state of a commit as reported by GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Success,
    Error,
    Failure,
    Pending,
}

impl StatusState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusState::Success => "success",
            StatusState::Error => "error",
            StatusState::Failure => "failure",
            StatusState::Pending => "pending",
        }
    }

    /// Every state except `pending` ends a watch.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusState::Pending)
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            StatusState::Success => 0,
            StatusState::Error | StatusState::Failure => 1,
            StatusState::Pending => 2,
        }
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a branch name fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchNameError {
    Empty,
    ContainsWhitespace(String),
}

impl fmt::Display for BranchNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchNameError::Empty => write!(f, "branch name cannot be empty"),
            BranchNameError::ContainsWhitespace(name) => {
                write!(f, "branch name '{name}' contains whitespace")
            }
        }
    }
}

impl std::error::Error for BranchNameError {}

/// Name of a branch as it exists on the remote, without the remote prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    pub fn new(name: impl Into<String>) -> Result<Self, BranchNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(BranchNameError::Empty);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(BranchNameError::ContainsWhitespace(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a user hint or local branch name.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.to_lowercase() == candidate.to_lowercase()
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error returned when a repository identity is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    EmptyOwner,
    EmptyName,
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::EmptyOwner => write!(f, "repository owner cannot be empty"),
            RepoError::EmptyName => write!(f, "repository name cannot be empty"),
        }
    }
}

impl std::error::Error for RepoError {}

/// GitHub repository identity (owner and name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo {
    owner: String,
    name: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoError> {
        let owner = owner.into();
        let name = name.into();
        if owner.is_empty() {
            return Err(RepoError::EmptyOwner);
        }
        if name.is_empty() {
            return Err(RepoError::EmptyName);
        }
        Ok(Self { owner, name })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One CI check contributing to the combined status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDetail {
    pub state: StatusState,
    pub context: String,
    pub description: String,
    pub target_url: Option<String>,
}

/// Point-in-time snapshot of a branch's combined status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub state: StatusState,
    pub details: Vec<CheckDetail>,
}

/// The open pull request built from a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub url: String,
    pub title: String,
}

/// Settings for a single run, fixed once the command line is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub branch_hint: Option<String>,
    pub poll_interval: Duration,
    pub once: bool,
    pub remote: String,
    pub request_timeout: Duration,
    pub debug: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            branch_hint: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            once: false,
            remote: DEFAULT_REMOTE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            debug: false,
        }
    }
}

/// How a run ended, mapped to the process exit code by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished(StatusState),
    /// The only fetch of a one-shot run failed.
    FetchFailed,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Finished(state) => state.exit_code(),
            Outcome::FetchFailed => 1,
        }
    }
}
