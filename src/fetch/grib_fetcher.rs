use crate::fetch::error::FetchError;
use crate::types::failure_policy::{DownloadSummary, FailedJob, FailurePolicy};
use crate::types::fetch_job::FetchJob;
use async_compression::tokio::bufread::BzDecoder;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::{Client, Proxy, Response};
use std::io;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

/// Downloads bzip2 compressed files and stores them decompressed.
///
/// Jobs are processed strictly one after the other.
#[derive(Debug, Clone)]
pub struct GribFetcher {
    client: Client,
}

impl GribFetcher {
    /// Creates a fetcher, optionally routing all requests through an HTTP(S) proxy.
    pub fn new(proxy: Option<&str>) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(proxy_url) = proxy {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| FetchError::InvalidProxy(proxy_url.to_string(), e))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(FetchError::ClientBuild)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Downloads one job and writes the decompressed file to its destination.
    pub async fn fetch(&self, job: &FetchJob) -> Result<PathBuf, FetchError> {
        info!("downloading file: '{}'", job.url);
        let data = self.download(&job.url).await?;

        let path = job.destination();
        info!("saving file as: '{}'", path.display());
        fs::write(&path, &data)
            .await
            .map_err(|e| FetchError::FileWrite(path.clone(), e))?;
        info!("Done.");
        Ok(path)
    }

    /// Downloads all jobs in order, handling failures according to `policy`.
    ///
    /// With [`FailurePolicy::FailFast`] the first error is returned and later jobs are
    /// not attempted. With [`FailurePolicy::ContinueOnError`] this always returns `Ok` and
    /// the failures are listed in the summary.
    pub async fn fetch_all(
        &self,
        jobs: &[FetchJob],
        policy: FailurePolicy,
    ) -> Result<DownloadSummary, FetchError> {
        let mut summary = DownloadSummary::default();
        for job in jobs {
            match self.fetch(job).await {
                Ok(path) => summary.saved.push(path),
                Err(e) if policy == FailurePolicy::FailFast => return Err(e),
                Err(e) => {
                    warn!("Failed to fetch {}: {}", job.url, e);
                    summary.failed.push(FailedJob {
                        url: job.url.clone(),
                        error: e,
                    });
                }
            }
        }
        info!(
            "Saved {} of {} files ({} failed)",
            summary.saved.len(),
            jobs.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    /// Downloads `url`, decoding the bzip2 body while it streams in.
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| request_error(url, e))?;

        let body = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
        let mut grib = Vec::new();
        BzDecoder::new(body)
            .read_to_end(&mut grib)
            .await
            .map_err(|e| FetchError::Decompress(url.to_string(), e))?;
        debug!("{}: {} bytes after decompression", url, grib.len());
        Ok(grib)
    }
}

fn request_error(url: &str, e: reqwest::Error) -> FetchError {
    match e.status() {
        Some(status) => FetchError::HttpStatus {
            url: url.to_string(),
            status,
            source: e,
        },
        None => FetchError::NetworkRequest(url.to_string(), e),
    }
}
