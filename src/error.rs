use crate::catalog::error::CatalogError;
use crate::expand::error::ExpandError;
use crate::fetch::error::FetchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Destination '{0}' does not exist or is not a directory")]
    InvalidDirectory(PathBuf),

    #[error("Destination '{0}' is not writable")]
    UnwritableDirectory(PathBuf, #[source] std::io::Error),

    #[error("Failed to inspect destination '{0}'")]
    DirectoryMetadata(PathBuf, #[source] std::io::Error),

    #[error("Unknown grid '{grid}', expected one of: {choices}")]
    UnknownGrid { grid: String, choices: String },

    #[error("{failed} of {total} downloads failed")]
    IncompleteDownload { failed: usize, total: usize },
}
