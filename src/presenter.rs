//! Seams between the polling core and the outside world: the terminal,
//! the desktop and the clock.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    github::ApiFailure,
    types::{BranchName, StatusRecord},
};

/// Terminal output for a run.
pub trait Presenter {
    /// Short progress message, e.g. while fetching.
    fn progress(&self, message: &str);

    /// Shows one status snapshot. Called exactly once per successful fetch.
    fn render(&self, branch: &BranchName, status: &StatusRecord);

    fn report_api_failure(&self, failure: &ApiFailure);

    /// Announces that the next fetch happens after `interval`.
    fn waiting(&self, interval: Duration);

    fn warn(&self, message: &str);
}

/// OS-level capabilities used once a watch reaches a terminal state.
#[async_trait]
pub trait Desktop {
    async fn notify(&self, title: &str, body: &str) -> Result<()>;

    async fn open_url(&self, url: &str) -> Result<()>;
}

/// Suspends the poll loop between two fetches.
#[async_trait]
pub trait Scheduler {
    async fn wait(&self, period: Duration);
}

/// [`Scheduler`] sleeping on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn wait(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}
