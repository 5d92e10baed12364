//! The handful of git commands needed to pick a branch and a repository.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::types::Repo;

/// Version control operations used while resolving the branch to watch.
#[async_trait]
pub trait Vcs {
    /// Refreshes the remote-tracking branches of `remote`.
    async fn fetch(&self, remote: &str) -> Result<()>;

    /// Name of the checked out branch, `None` on a detached HEAD.
    async fn current_branch(&self) -> Result<Option<String>>;

    /// Branch names known for `remote`, without the `remote/` prefix.
    async fn remote_branches(&self, remote: &str) -> Result<Vec<String>>;

    async fn remote_url(&self, remote: &str) -> Result<String>;
}

/// [`Vcs`] backed by the `git` executable in the current directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

/// Runs git with `args` and returns its trimmed stdout.
async fn git_command(args: &[&str]) -> Result<String> {
    debug!("running git {}", args.join(" "));
    let output = Command::new("git")
        .args(args)
        .output()
        .await
        .context("Failed to run git; is it installed and on PATH?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }

    let stdout = String::from_utf8(output.stdout)
        .with_context(|| format!("git {} produced non UTF-8 output", args.join(" ")))?;
    Ok(stdout.trim().to_string())
}

#[async_trait]
impl Vcs for GitCli {
    async fn fetch(&self, remote: &str) -> Result<()> {
        git_command(&["fetch", "--prune", remote]).await.map(|_| ())
    }

    async fn current_branch(&self) -> Result<Option<String>> {
        let name = git_command(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        if name == "HEAD" || name.is_empty() {
            Ok(None)
        } else {
            Ok(Some(name))
        }
    }

    async fn remote_branches(&self, remote: &str) -> Result<Vec<String>> {
        let listing = git_command(&["branch", "--remotes"]).await?;
        Ok(parse_remote_branches(&listing, remote))
    }

    async fn remote_url(&self, remote: &str) -> Result<String> {
        git_command(&["remote", "get-url", remote]).await
    }
}

/// Extracts the branches of `remote` from `git branch --remotes` output.
///
/// Symbolic refs such as `origin/HEAD -> origin/main` are skipped, as are
/// branches belonging to other remotes.
pub fn parse_remote_branches(listing: &str, remote: &str) -> Vec<String> {
    let prefix = format!("{remote}/");
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains(" -> "))
        .filter_map(|line| line.strip_prefix(&prefix))
        .filter(|branch| !branch.is_empty() && *branch != "HEAD")
        .map(str::to_string)
        .collect()
}

fn scp_like_remote() -> &'static Regex {
    static SCP_LIKE: OnceLock<Regex> = OnceLock::new();
    SCP_LIKE.get_or_init(|| {
        Regex::new(r"^(?:[\w.-]+@)?[\w.-]+:(?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?/?$")
            .expect("scp-like remote pattern is valid")
    })
}

/// Derives the GitHub owner and repository from a remote URL.
///
/// Accepts `https://github.com/owner/repo(.git)`, `ssh://git@github.com/owner/repo.git`
/// and the scp-like `git@github.com:owner/repo.git` form.
pub fn parse_repo_from_remote_url(remote_url: &str) -> Result<Repo> {
    let remote_url = remote_url.trim();

    if let Ok(url) = url::Url::parse(remote_url)
        && url.host_str().is_some()
    {
        let segments: Vec<&str> = url
            .path_segments()
            .context("Remote URL has no path")?
            .filter(|segment| !segment.is_empty())
            .collect();
        if segments.len() != 2 {
            anyhow::bail!(
                "Remote URL must point at 'owner/repo', got: '{}'",
                remote_url
            );
        }
        let name = segments[1].strip_suffix(".git").unwrap_or(segments[1]);
        return Repo::new(segments[0], name)
            .with_context(|| format!("Invalid repository in remote URL: '{}'", remote_url));
    }

    let captures = scp_like_remote()
        .captures(remote_url)
        .with_context(|| format!("Unrecognised remote URL: '{}'", remote_url))?;
    Repo::new(&captures["owner"], &captures["repo"])
        .with_context(|| format!("Invalid repository in remote URL: '{}'", remote_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remote_branch_listing() {
        let listing = "  origin/HEAD -> origin/main\n  origin/feature-x\n  origin/main\n";
        assert_eq!(
            parse_remote_branches(listing, "origin"),
            vec!["feature-x".to_string(), "main".to_string()]
        );
    }

    #[test]
    fn ignores_branches_of_other_remotes() {
        let listing = "  origin/main\n  upstream/main\n  upstream/release/1.0\n";
        assert_eq!(
            parse_remote_branches(listing, "upstream"),
            vec!["main".to_string(), "release/1.0".to_string()]
        );
    }

    #[test]
    fn keeps_slashes_inside_branch_names() {
        let listing = "  origin/feature/login-form";
        assert_eq!(
            parse_remote_branches(listing, "origin"),
            vec!["feature/login-form".to_string()]
        );
    }

    #[test]
    fn empty_listing_yields_no_branches() {
        assert!(parse_remote_branches("", "origin").is_empty());
    }

    #[test]
    fn parses_https_remote() {
        let repo = parse_repo_from_remote_url("https://github.com/octo/widgets.git").unwrap();
        assert_eq!(repo.owner(), "octo");
        assert_eq!(repo.name(), "widgets");

        let repo = parse_repo_from_remote_url("https://github.com/octo/widgets").unwrap();
        assert_eq!(repo.to_string(), "octo/widgets");
    }

    #[test]
    fn parses_ssh_remotes() {
        let repo = parse_repo_from_remote_url("git@github.com:octo/widgets.git").unwrap();
        assert_eq!(repo.to_string(), "octo/widgets");

        let repo = parse_repo_from_remote_url("ssh://git@github.com/octo/widgets.git").unwrap();
        assert_eq!(repo.to_string(), "octo/widgets");
    }

    #[test]
    fn rejects_urls_without_owner_and_repo() {
        assert!(parse_repo_from_remote_url("https://github.com/octo").is_err());
        assert!(parse_repo_from_remote_url("not a remote").is_err());
    }
}
