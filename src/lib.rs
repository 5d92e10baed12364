//! prwatch: watch the CI status of a branch on GitHub.
//!
//! Resolves which remote branch corresponds to the local work, polls the
//! combined commit status of its head until it settles, and then opens the
//! branch's pull request with a desktop notification. Terminal rendering,
//! notifications and timing are reached through the traits in
//! [`presenter`], so the polling logic can run against test doubles.

pub mod cli;
pub mod git;
pub mod github;
pub mod poll;
pub mod presenter;
pub mod pull_request;
pub mod resolver;
pub mod status;
pub mod types;

pub use cli::{parse_args, parse_duration};
pub use git::{GitCli, Vcs, parse_remote_branches, parse_repo_from_remote_url};
pub use github::{
    ApiFailure, CombinedStatus, CommitStatus, Forge, GitHub, TokenError, find_github_token,
    get_github_token,
};
pub use poll::PollController;
pub use presenter::{Desktop, Presenter, Scheduler, TokioScheduler};
pub use pull_request::{find_by_branch, pull_request_query};
pub use resolver::{ResolveError, match_remote_branch, resolve_branch};
pub use status::get_status;
pub use types::{
    BranchName, BranchNameError, CheckDetail, Outcome, PullRequestRef, Repo, RepoError,
    RunConfig, StatusRecord, StatusState,
};
