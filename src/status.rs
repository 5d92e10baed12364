use tracing::debug;

use crate::{
    github::{ApiFailure, CombinedStatus, CommitStatus, Forge},
    presenter::Presenter,
    types::{BranchName, CheckDetail, StatusRecord},
};

impl From<CommitStatus> for CheckDetail {
    fn from(status: CommitStatus) -> Self {
        CheckDetail {
            state: status.state,
            context: status.context.unwrap_or_default(),
            description: status.description.unwrap_or_default(),
            target_url: status.target_url,
        }
    }
}

impl From<CombinedStatus> for StatusRecord {
    /// Keeps the remote aggregate state as is; it is never recomputed
    /// from the individual checks.
    fn from(combined: CombinedStatus) -> Self {
        StatusRecord {
            state: combined.state,
            details: combined.statuses.into_iter().map(CheckDetail::from).collect(),
        }
    }
}

/// Fetches the combined status of `branch`.
///
/// Failures are reported through `presenter` and turned into `None`, meaning
/// "no new information this cycle".
pub async fn get_status<F, P>(forge: &F, presenter: &P, branch: &BranchName) -> Option<StatusRecord>
where
    F: Forge + Sync + ?Sized,
    P: Presenter + ?Sized,
{
    match forge.combined_status(branch).await {
        Ok(combined) => {
            let record = StatusRecord::from(combined);
            debug!(
                "{branch}: {} with {} checks",
                record.state,
                record.details.len()
            );
            Some(record)
        }
        Err(error) => {
            presenter.report_api_failure(&ApiFailure::from_error(&error));
            None
        }
    }
}
