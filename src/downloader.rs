//! Main entry point: plans and downloads NWP files from the open data server.

use crate::catalog::model_catalog::ModelCatalog;
use crate::error::DownloaderError;
use crate::expand::request_expander::RequestExpander;
use crate::fetch::grib_fetcher::GribFetcher;
use crate::types::download_request::DownloadRequest;
use crate::types::failure_policy::{DownloadSummary, FailurePolicy};
use crate::types::fetch_job::FetchJob;
use bon::bon;
use chrono::NaiveDateTime;
use std::path::PathBuf;

/// Field list used when a request names none.
pub const DEFAULT_FIELDS: &str = "t_2m";

/// Client combining a model catalog with a fetcher.
///
/// Create one with [`Downloader::builder()`]. Without a catalog the bundled DWD model
/// definitions are used.
///
/// # Examples
///
/// ```rust
/// # use opendata_downloader::{Downloader, DownloaderError};
/// # use chrono::NaiveDate;
/// # fn run() -> Result<(), DownloaderError> {
/// let downloader = Downloader::builder().build()?;
/// let run = NaiveDate::from_ymd_opt(2020, 6, 26).unwrap().and_hms_opt(9, 0, 0).unwrap();
///
/// let jobs = downloader
///     .plan()
///     .model("icon-eu")
///     .fields("t_2m,clch")
///     .max_time_step(6)
///     .time_step_interval(3)
///     .timestamp(run)
///     .directory("/tmp")
///     .call()?;
///
/// assert_eq!(jobs.len(), 6);
/// assert_eq!(
///     jobs[0].file_name,
///     "icon-eu_europe_regular-lat-lon_single-level_2020062609_000_T_2M.grib2"
/// );
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug)]
pub struct Downloader {
    catalog: ModelCatalog,
    fetcher: GribFetcher,
    failure_policy: FailurePolicy,
}

#[bon]
impl Downloader {
    /// Creates a downloader.
    ///
    /// # Arguments
    ///
    /// * `.catalog(ModelCatalog)`: Optional. Replaces the bundled model definitions.
    /// * `.proxy(&str)`: Optional. HTTP(S) proxy for all downloads.
    /// * `.failure_policy(FailurePolicy)`: Optional. Defaults to [`FailurePolicy::FailFast`].
    ///
    /// # Errors
    ///
    /// Returns [`DownloaderError::Catalog`] if the bundled catalog cannot be loaded and
    /// [`DownloaderError::Fetch`] if the proxy is invalid.
    #[builder]
    pub fn new(
        catalog: Option<ModelCatalog>,
        #[builder(into)] proxy: Option<String>,
        failure_policy: Option<FailurePolicy>,
    ) -> Result<Self, DownloaderError> {
        let catalog = match catalog {
            Some(catalog) => catalog,
            None => ModelCatalog::bundled()?,
        };
        Ok(Self {
            catalog,
            fetcher: GribFetcher::new(proxy.as_deref())?,
            failure_policy: failure_policy.unwrap_or_default(),
        })
    }

    /// Expands a request into the files it covers without downloading anything.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.model(&str)`: Optional. Defaults to the first model of the catalog.
    /// * `.grid(&str)`: Optional. Defaults to the model's first grid.
    /// * `.fields(&str)`: Optional. Comma separated field names, defaults to `t_2m`.
    /// * `.min_time_step(u32)`, `.max_time_step(u32)`, `.time_step_interval(u32)`:
    ///   Optional. Default to a single step 0.
    /// * `.timestamp(NaiveDateTime)`: Optional. Run time in UTC, defaults to the most
    ///   recent published run of the model.
    /// * `.directory(PathBuf)`: Optional. Defaults to the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`DownloaderError::Expand`] for unknown models, invalid requests and
    /// patterns that cannot be rendered.
    #[builder]
    pub fn plan(
        &self,
        model: Option<&str>,
        grid: Option<&str>,
        fields: Option<&str>,
        min_time_step: Option<u32>,
        max_time_step: Option<u32>,
        time_step_interval: Option<u32>,
        timestamp: Option<NaiveDateTime>,
        #[builder(into)] directory: Option<PathBuf>,
    ) -> Result<Vec<FetchJob>, DownloaderError> {
        let model = model.unwrap_or_else(|| self.catalog.default_model().name());
        let request = DownloadRequest::builder()
            .model(model)
            .maybe_grid(grid)
            .fields(fields.unwrap_or(DEFAULT_FIELDS))
            .maybe_min_time_step(min_time_step)
            .maybe_max_time_step(max_time_step)
            .maybe_time_step_interval(time_step_interval)
            .maybe_timestamp(timestamp)
            .maybe_directory(directory)
            .build()?;
        self.plan_request(&request)
    }

    /// Plans and downloads a request. Takes the same arguments as [`Downloader::plan`].
    ///
    /// # Errors
    ///
    /// Everything [`Downloader::plan`] returns, plus [`DownloaderError::Fetch`] for the
    /// first failed download when the failure policy is [`FailurePolicy::FailFast`].
    #[builder]
    pub async fn download(
        &self,
        model: Option<&str>,
        grid: Option<&str>,
        fields: Option<&str>,
        min_time_step: Option<u32>,
        max_time_step: Option<u32>,
        time_step_interval: Option<u32>,
        timestamp: Option<NaiveDateTime>,
        #[builder(into)] directory: Option<PathBuf>,
    ) -> Result<DownloadSummary, DownloaderError> {
        let jobs = self
            .plan()
            .maybe_model(model)
            .maybe_grid(grid)
            .maybe_fields(fields)
            .maybe_min_time_step(min_time_step)
            .maybe_max_time_step(max_time_step)
            .maybe_time_step_interval(time_step_interval)
            .maybe_timestamp(timestamp)
            .maybe_directory(directory)
            .call()?;
        self.fetch(&jobs).await
    }
}

impl Downloader {
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn plan_request(&self, request: &DownloadRequest) -> Result<Vec<FetchJob>, DownloaderError> {
        Ok(RequestExpander::new(&self.catalog).expand(request)?)
    }

    /// Downloads `jobs` one after the other, following the configured failure policy.
    pub async fn fetch(&self, jobs: &[FetchJob]) -> Result<DownloadSummary, DownloaderError> {
        Ok(self.fetcher.fetch_all(jobs, self.failure_policy).await?)
    }

    /// Most recent published run of `model`.
    pub fn most_recent_timestamp(&self, model: &str) -> Result<NaiveDateTime, DownloaderError> {
        Ok(self.catalog.most_recent_model_timestamp(model)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::error::CatalogError;
    use crate::expand::error::ExpandError;
    use crate::fetch::error::FetchError;
    use crate::fetch::grib_fetcher::tests::{bz2, local_fetcher, serve, GRIB_PAYLOAD};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn run_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 6, 26)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn local_catalog(base: &str) -> ModelCatalog {
        ModelCatalog::from_json_str(&format!(
            r#"[{{
                "model": "icon-eu",
                "scope": "europe",
                "intervalHours": 3,
                "grids": ["regular-lat-lon"],
                "pattern": {{ "single-level": "{base}/{{model!L}}/{{param!L}}/{{model!L}}_{{timestamp:%Y%m%d}}{{modelrun:>02d}}_{{step:>03d}}_{{param!U}}.grib2.bz2" }},
                "openDataDeliveryOffsetMinutes": 240
            }}]"#
        ))
        .unwrap()
    }

    fn local_downloader(base: &str, failure_policy: FailurePolicy) -> Downloader {
        Downloader {
            catalog: local_catalog(base),
            fetcher: local_fetcher(),
            failure_policy,
        }
    }

    #[test]
    fn plan_uses_defaults() -> Result<(), DownloaderError> {
        let downloader = Downloader::builder().build()?;

        let jobs = downloader
            .plan()
            .timestamp(run_time())
            .directory("/tmp")
            .call()?;

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].model, "icon");
        assert_eq!(jobs[0].grid, "icosahedral");
        assert_eq!(jobs[0].field, "t_2m");
        assert_eq!(jobs[0].step, 0);
        assert_eq!(
            jobs[0].url,
            "https://opendata.dwd.de/weather/nwp/icon/grib/09/t_2m/icon_global_icosahedral_single-level_2020062609_000_T_2M.grib2.bz2"
        );
        Ok(())
    }

    #[test]
    fn plan_unknown_model() {
        let downloader = Downloader::builder().build().unwrap();
        let result = downloader.plan().model("gfs").directory("/tmp").call();
        assert!(matches!(
            result,
            Err(DownloaderError::Expand(ExpandError::Catalog(
                CatalogError::UnknownModel(_)
            )))
        ));
    }

    #[test]
    fn custom_catalog_and_policy() -> Result<(), DownloaderError> {
        let downloader = Downloader::builder()
            .catalog(local_catalog("http://localhost"))
            .failure_policy(FailurePolicy::ContinueOnError)
            .build()?;

        assert_eq!(downloader.failure_policy(), FailurePolicy::ContinueOnError);
        assert_eq!(downloader.catalog().default_model().name(), "icon-eu");
        assert!(downloader.most_recent_timestamp("icon-eu").is_ok());
        assert!(downloader.most_recent_timestamp("icon").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn downloads_all_steps_and_fields() -> Result<(), DownloaderError> {
        let payload = bz2(GRIB_PAYLOAD).await;
        let mut routes = HashMap::new();
        for (param, step) in [("t_2m", "000"), ("clch", "000"), ("t_2m", "003"), ("clch", "003")] {
            routes.insert(
                format!(
                    "/icon-eu/{}/icon-eu_2020062609_{}_{}.grib2.bz2",
                    param,
                    step,
                    param.to_uppercase()
                ),
                payload.clone(),
            );
        }
        let base = serve(routes).await;
        let dir = tempfile::tempdir().unwrap();

        let summary = local_downloader(&base, FailurePolicy::FailFast)
            .download()
            .fields("t_2m, clch")
            .max_time_step(3)
            .time_step_interval(3)
            .timestamp(run_time())
            .directory(dir.path())
            .call()
            .await?;

        assert!(summary.is_complete());
        let names: Vec<String> = summary
            .saved
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "icon-eu_2020062609_000_T_2M.grib2",
                "icon-eu_2020062609_000_CLCH.grib2",
                "icon-eu_2020062609_003_T_2M.grib2",
                "icon-eu_2020062609_003_CLCH.grib2",
            ]
        );
        for path in &summary.saved {
            assert_eq!(std::fs::read(path).unwrap(), GRIB_PAYLOAD);
        }
        Ok(())
    }

    #[tokio::test]
    async fn fail_fast_surfaces_fetch_error() {
        let base = serve(HashMap::new()).await;
        let dir = tempfile::tempdir().unwrap();

        let result = local_downloader(&base, FailurePolicy::FailFast)
            .download()
            .timestamp(run_time())
            .directory(dir.path())
            .call()
            .await;

        assert!(matches!(
            result,
            Err(DownloaderError::Fetch(FetchError::HttpStatus { .. }))
        ));
    }
}
