use tracing::debug;

use crate::{
    github::{ApiFailure, Forge},
    presenter::Presenter,
    types::{BranchName, PullRequestRef, Repo},
};

/// Search query for open pull requests in `repo` containing commit `sha`.
pub fn pull_request_query(repo: &Repo, sha: &str) -> String {
    format!("repo:{repo} is:pr is:open {sha}")
}

/// Finds the open pull request whose head is the tip of `branch`.
///
/// Returns `None` when the branch has no open pull request or when GitHub
/// could not be queried; the failure is reported through `presenter`.
pub async fn find_by_branch<F, P>(
    forge: &F,
    presenter: &P,
    branch: &BranchName,
) -> Option<PullRequestRef>
where
    F: Forge + Sync + ?Sized,
    P: Presenter + ?Sized,
{
    let sha = match forge.branch_head_sha(branch).await {
        Ok(sha) => sha,
        Err(error) => {
            presenter.report_api_failure(&ApiFailure::from_error(&error));
            return None;
        }
    };
    debug!("{branch} head is {sha}");

    let query = pull_request_query(forge.repo(), &sha);
    match forge.search_pull_requests(&query).await {
        Ok(pull_requests) => pull_requests.into_iter().next(),
        Err(error) => {
            presenter.report_api_failure(&ApiFailure::from_error(&error));
            None
        }
    }
}
