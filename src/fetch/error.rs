use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Invalid proxy '{0}'")]
    InvalidProxy(String, #[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download or decompression failed for {0}")]
    Decompress(String, #[source] std::io::Error),

    #[error("Failed to write file '{0}'")]
    FileWrite(PathBuf, #[source] std::io::Error),
}
