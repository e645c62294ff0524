use chrono::NaiveDateTime;
use std::path::PathBuf;

/// A single file to download: one field at one forecast step of one model run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    /// Fully rendered URL of the compressed file.
    pub url: String,
    /// Name of the decompressed file, the URL's last segment without `.bz2`.
    pub file_name: String,
    /// Directory the decompressed file is written to.
    pub directory: PathBuf,
    pub model: String,
    pub grid: String,
    pub field: String,
    /// Forecast lead time in hours.
    pub step: u32,
    pub timestamp: NaiveDateTime,
}

impl FetchJob {
    /// Full path of the decompressed file.
    pub fn destination(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}
