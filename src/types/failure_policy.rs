use crate::error::DownloaderError;
use crate::fetch::error::FetchError;
use std::path::PathBuf;

/// What to do with the remaining jobs once one of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure and return its error.
    #[default]
    FailFast,
    /// Log the failure, attempt every remaining job and report all failures at the end.
    ContinueOnError,
}

/// A job that could not be completed.
#[derive(Debug)]
pub struct FailedJob {
    pub url: String,
    pub error: FetchError,
}

/// Outcome of a sequence of downloads.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    /// Paths of the files written, in job order.
    pub saved: Vec<PathBuf>,
    pub failed: Vec<FailedJob>,
}

impl DownloadSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turns a summary with failed jobs into [`DownloaderError::IncompleteDownload`].
    pub fn ensure_complete(&self) -> Result<(), DownloaderError> {
        if self.is_complete() {
            return Ok(());
        }
        Err(DownloaderError::IncompleteDownload {
            failed: self.failed.len(),
            total: self.saved.len() + self.failed.len(),
        })
    }
}
