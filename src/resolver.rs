use std::fmt;

use tracing::{debug, warn};

use crate::{git::Vcs, types::BranchName};

/// Fatal reasons for not finding a branch to watch.
#[derive(Debug)]
pub enum ResolveError {
    BranchNotFound { name: String, remote: String },
    NoRemoteBranches { remote: String },
    DetachedHead,
    Git(anyhow::Error),
}

impl ResolveError {
    /// Actionable follow-up lines printed below the error.
    pub fn remediation(&self) -> Vec<String> {
        match self {
            ResolveError::BranchNotFound { remote, .. } => vec![
                "Make sure it hasn't been deleted".to_string(),
                format!("Push it with 'git push -u {remote} HEAD' if it only exists locally"),
            ],
            ResolveError::NoRemoteBranches { remote } => vec![format!(
                "Check that '{remote}' is the right remote and that you can fetch from it"
            )],
            ResolveError::DetachedHead => {
                vec!["Check out a branch or pass its name as an argument".to_string()]
            }
            ResolveError::Git(_) => {
                vec!["Run prwatch from inside a git repository".to_string()]
            }
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::BranchNotFound { name, remote } => {
                write!(f, "No branch {name} found on {remote}")
            }
            ResolveError::NoRemoteBranches { remote } => {
                write!(f, "No remote branch found on {remote}")
            }
            ResolveError::DetachedHead => write!(f, "HEAD is detached, no current branch"),
            ResolveError::Git(error) => write!(f, "{error:#}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Git(error) => Some(&**error),
            _ => None,
        }
    }
}

/// Picks the remote branch whose name equals `wanted` ignoring case.
///
/// An exact match is preferred when several remote branches differ only by
/// case.
pub fn match_remote_branch(remote_branches: &[String], wanted: &str) -> Option<BranchName> {
    let found = remote_branches
        .iter()
        .find(|branch| branch.as_str() == wanted)
        .or_else(|| {
            let wanted = wanted.to_lowercase();
            remote_branches
                .iter()
                .find(|branch| branch.to_lowercase() == wanted)
        })?;
    BranchName::new(found.clone()).ok()
}

/// Maps a branch hint, or the current local branch, to a branch on `remote`.
///
/// The remote is fetched first so freshly pushed branches are seen. A failed
/// fetch is not fatal: resolution falls back to the last known remote refs.
pub async fn resolve_branch<V>(
    vcs: &V,
    remote: &str,
    hint: Option<&str>,
    on_progress: &dyn Fn(&str),
) -> Result<BranchName, ResolveError>
where
    V: Vcs + Sync,
{
    on_progress(&format!("Fetching {remote}"));
    if let Err(error) = vcs.fetch(remote).await {
        warn!("git fetch {remote} failed, using known remote branches: {error:#}");
    }

    let wanted = match hint {
        Some(hint) => hint.to_string(),
        None => vcs
            .current_branch()
            .await
            .map_err(ResolveError::Git)?
            .ok_or(ResolveError::DetachedHead)?,
    };

    let remote_branches = vcs
        .remote_branches(remote)
        .await
        .map_err(ResolveError::Git)?;
    debug!("{} branches on {remote}", remote_branches.len());
    if remote_branches.is_empty() {
        return Err(ResolveError::NoRemoteBranches {
            remote: remote.to_string(),
        });
    }

    match_remote_branch(&remote_branches, &wanted).ok_or_else(|| ResolveError::BranchNotFound {
        name: wanted,
        remote: remote.to_string(),
    })
}
