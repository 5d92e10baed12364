//! The watch loop: fetch, render, then either wait for the next poll or
//! wrap up by opening the pull request.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    github::Forge,
    presenter::{Desktop, Presenter, Scheduler},
    pull_request::find_by_branch,
    status::get_status,
    types::{BranchName, Outcome, RunConfig, StatusState},
};

/// Drives the status polls for one branch until the run is over.
///
/// In watch mode the branch is polled every `poll_interval` until its
/// combined state leaves `pending`; the pull request is then looked up,
/// announced and opened. In one-shot mode a single snapshot is rendered and
/// nothing else happens. Polls never overlap: the next fetch only starts
/// after the previous render and the scheduled wait.
pub struct PollController<'a, F: ?Sized, P: ?Sized, D: ?Sized, S: ?Sized> {
    branch: BranchName,
    poll_interval: Duration,
    once: bool,
    forge: &'a F,
    presenter: &'a P,
    desktop: &'a D,
    scheduler: &'a S,
}

impl<'a, F, P, D, S> PollController<'a, F, P, D, S>
where
    F: Forge + Sync + ?Sized,
    P: Presenter + ?Sized,
    D: Desktop + Sync + ?Sized,
    S: Scheduler + Sync + ?Sized,
{
    pub fn new(
        branch: BranchName,
        config: &RunConfig,
        forge: &'a F,
        presenter: &'a P,
        desktop: &'a D,
        scheduler: &'a S,
    ) -> Self {
        Self {
            branch,
            poll_interval: config.poll_interval,
            once: config.once,
            forge,
            presenter,
            desktop,
            scheduler,
        }
    }

    /// Runs to completion. Consumes the controller so the terminal
    /// notification can only ever be sent once.
    pub async fn run(self) -> Outcome {
        if self.once {
            self.run_once().await
        } else {
            self.watch().await
        }
    }

    async fn run_once(self) -> Outcome {
        self.presenter
            .progress(&format!("Fetching {} data", self.branch));

        match get_status(self.forge, self.presenter, &self.branch).await {
            Some(status) => {
                self.presenter.progress("Data fetched");
                self.presenter.render(&self.branch, &status);
                Outcome::Finished(status.state)
            }
            None => Outcome::FetchFailed,
        }
    }

    async fn watch(self) -> Outcome {
        let mut polls = 0u64;
        let mut fetched_once = false;
        self.presenter
            .progress(&format!("Fetching {} data", self.branch));

        loop {
            polls += 1;
            debug!("poll #{polls} for {}", self.branch);

            match get_status(self.forge, self.presenter, &self.branch).await {
                Some(status) => {
                    if !fetched_once {
                        fetched_once = true;
                        self.presenter.progress("Data fetched");
                    }
                    self.presenter.render(&self.branch, &status);

                    if status.state.is_terminal() {
                        self.announce(status.state).await;
                        return Outcome::Finished(status.state);
                    }
                }
                None => warn!(
                    "poll #{polls} for {} failed, retrying in {}s",
                    self.branch,
                    self.poll_interval.as_secs()
                ),
            }

            self.presenter.waiting(self.poll_interval);
            self.scheduler.wait(self.poll_interval).await;
        }
    }

    /// Notifies about the final state and opens the pull request. Skipped,
    /// with a warning, when the branch has no open pull request.
    async fn announce(&self, state: StatusState) {
        let Some(pull_request) = find_by_branch(self.forge, self.presenter, &self.branch).await
        else {
            self.presenter.warn(&format!(
                "No open pull request found for {}, skipping notification",
                self.branch
            ));
            return;
        };

        if let Err(error) = self
            .desktop
            .notify(&format!("Build {state}"), &pull_request.title)
            .await
        {
            self.presenter
                .warn(&format!("Could not show notification: {error:#}"));
        }

        if let Err(error) = self.desktop.open_url(&pull_request.url).await {
            self.presenter
                .warn(&format!("Could not open {}: {error:#}", pull_request.url));
        }
    }
}
