//! Expansion of a [`DownloadRequest`] into the concrete files to fetch.

use crate::catalog::model_catalog::ModelCatalog;
use crate::expand::error::ExpandError;
use crate::template::renderer::UrlTemplate;
use crate::template::value::TemplateValues;
use crate::timestamp::most_recent_run_timestamp;
use crate::types::download_request::DownloadRequest;
use crate::types::fetch_job::FetchJob;
use crate::types::level_type::LevelType;
use crate::types::model_config::ModelConfig;
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use log::{debug, warn};
use std::num::NonZeroU32;

/// Extension of the compressed files on the server.
pub const COMPRESSION_SUFFIX: &str = ".bz2";

/// Forecast steps `min, min + interval, ...` up to and including `max` if it lies on
/// the sequence.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroU32;
/// use opendata_downloader::time_steps;
///
/// let three = NonZeroU32::new(3).unwrap();
/// assert_eq!(time_steps(0, 12, three).collect::<Vec<_>>(), [0, 3, 6, 9, 12]);
/// assert_eq!(time_steps(0, 10, three).collect::<Vec<_>>(), [0, 3, 6, 9]);
/// ```
pub fn time_steps(min: u32, max: u32, interval: NonZeroU32) -> impl Iterator<Item = u32> {
    (min..=max).step_by(interval.get() as usize)
}

/// The local file name for `url`: its last path segment without the compression suffix.
pub fn target_file_name(url: &str) -> String {
    let segment = url.rsplit('/').next().unwrap_or(url);
    segment
        .strip_suffix(COMPRESSION_SUFFIX)
        .unwrap_or(segment)
        .to_string()
}

/// Turns download requests into ordered [`FetchJob`]s using the models of a catalog.
#[derive(Debug, Clone, Copy)]
pub struct RequestExpander<'a> {
    catalog: &'a ModelCatalog,
}

impl<'a> RequestExpander<'a> {
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self { catalog }
    }

    /// Expands `request`, resolving a missing timestamp against the current time.
    pub fn expand(&self, request: &DownloadRequest) -> Result<Vec<FetchJob>, ExpandError> {
        self.expand_at(request, Utc::now())
    }

    /// Expands `request` into one job per (time step, field) pair.
    ///
    /// Jobs are ordered by time step first and then by the request's field order. A
    /// missing timestamp is resolved once, against `now`, using the model's run interval
    /// and publication delay.
    ///
    /// # Errors
    ///
    /// * [`ExpandError::Catalog`] with [`crate::CatalogError::UnknownModel`] if the model
    ///   is not in the catalog
    /// * [`ExpandError::MissingPattern`] if the model has no pattern for the level type
    /// * [`ExpandError::Template`] if the model's pattern cannot be rendered
    pub fn expand_at(
        &self,
        request: &DownloadRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<FetchJob>, ExpandError> {
        let config = self.catalog.lookup(request.model())?;
        let grid = resolve_grid(config, request.grid());
        let timestamp = request.timestamp().unwrap_or_else(|| {
            most_recent_run_timestamp(
                now,
                config.publication_delay_minutes(),
                config.interval_hours(),
            )
        });
        let template = parse_pattern(config, request.level_type())?;

        let steps = time_steps(
            request.min_time_step(),
            request.max_time_step(),
            request.time_step_interval(),
        );
        let mut jobs = Vec::new();
        for step in steps {
            for field in request.fields() {
                let url = render_url(
                    &template,
                    config,
                    &grid,
                    field,
                    step,
                    timestamp,
                    request.level_type(),
                )?;
                debug!("Resolved {} step {:03} to {}", field, step, url);
                jobs.push(FetchJob {
                    file_name: target_file_name(&url),
                    url,
                    directory: request.directory().to_path_buf(),
                    model: config.name().to_string(),
                    grid: grid.clone(),
                    field: field.clone(),
                    step,
                    timestamp,
                });
            }
        }
        Ok(jobs)
    }

    /// Renders the URL of a single single-level file.
    pub fn grib_file_url(
        &self,
        model: &str,
        grid: Option<&str>,
        param: &str,
        step: u32,
        timestamp: NaiveDateTime,
    ) -> Result<String, ExpandError> {
        let config = self.catalog.lookup(model)?;
        let grid = resolve_grid(config, grid);
        let template = parse_pattern(config, LevelType::SingleLevel)?;
        render_url(
            &template,
            config,
            &grid,
            param,
            step,
            timestamp,
            LevelType::SingleLevel,
        )
    }
}

/// Picks the requested grid or the model default. Unknown grids are used as given.
fn resolve_grid(config: &ModelConfig, grid: Option<&str>) -> String {
    match grid {
        None => {
            warn!("No grid specified. Trying to use default.");
            let grid = config.default_grid();
            warn!("Grid type '{}' selected", grid);
            grid.to_string()
        }
        Some(grid) => {
            if !config.supports_grid(grid) {
                warn!("Unknown grid type '{}' for model '{}'.", grid, config.name());
            }
            grid.to_string()
        }
    }
}

fn parse_pattern(config: &ModelConfig, level_type: LevelType) -> Result<UrlTemplate, ExpandError> {
    let pattern = config
        .pattern_for(level_type)
        .ok_or_else(|| ExpandError::MissingPattern {
            model: config.name().to_string(),
            level_type,
        })?;
    UrlTemplate::parse(pattern).map_err(|source| ExpandError::Template {
        model: config.name().to_string(),
        source,
    })
}

fn render_url(
    template: &UrlTemplate,
    config: &ModelConfig,
    grid: &str,
    param: &str,
    step: u32,
    timestamp: NaiveDateTime,
    level_type: LevelType,
) -> Result<String, ExpandError> {
    let values = TemplateValues::new()
        .with("model", config.name())
        .with("param", param)
        .with("grid", grid)
        .with("modelrun", timestamp.hour())
        .with("scope", config.scope())
        .with("levtype", level_type.pattern_key())
        .with("timestamp", timestamp)
        .with("step", step);
    template
        .render(&values)
        .map_err(|source| ExpandError::Template {
            model: config.name().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::error::CatalogError;
    use crate::template::error::TemplateError;
    use chrono::{NaiveDate, TimeZone};
    use std::path::Path;

    fn run_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 6, 26)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn request(model: &str, grid: Option<&str>, fields: &str, min: u32, max: u32, interval: u32) -> DownloadRequest {
        DownloadRequest::builder()
            .model(model)
            .maybe_grid(grid)
            .fields(fields)
            .min_time_step(min)
            .max_time_step(max)
            .time_step_interval(interval)
            .timestamp(run_time())
            .directory("/data/nwp")
            .build()
            .unwrap()
    }

    #[test]
    fn steps_on_the_sequence() {
        let catalog = ModelCatalog::bundled().unwrap();
        let expander = RequestExpander::new(&catalog);

        let jobs = expander
            .expand(&request("icon", None, "t_2m", 0, 12, 3))
            .unwrap();
        let steps: Vec<u32> = jobs.iter().map(|job| job.step).collect();
        assert_eq!(steps, [0, 3, 6, 9, 12]);

        let jobs = expander
            .expand(&request("icon", None, "t_2m", 0, 10, 3))
            .unwrap();
        let steps: Vec<u32> = jobs.iter().map(|job| job.step).collect();
        assert_eq!(steps, [0, 3, 6, 9]);
    }

    #[test]
    fn single_step_by_default() {
        let steps: Vec<u32> = time_steps(5, 5, NonZeroU32::new(1).unwrap()).collect();
        assert_eq!(steps, [5]);
    }

    #[test]
    fn fields_keep_caller_order() {
        let catalog = ModelCatalog::bundled().unwrap();
        let jobs = RequestExpander::new(&catalog)
            .expand(&request("icon", None, "t_2m, tmax_2m ,clch", 0, 0, 1))
            .unwrap();
        let fields: Vec<&str> = jobs.iter().map(|job| job.field.as_str()).collect();
        assert_eq!(fields, ["t_2m", "tmax_2m", "clch"]);
    }

    #[test]
    fn end_to_end_icon_eu() {
        let catalog = ModelCatalog::bundled().unwrap();
        let jobs = RequestExpander::new(&catalog)
            .expand(&request("icon-eu", Some("icosahedral"), "t_2m,clch", 0, 6, 3))
            .unwrap();

        let order: Vec<(u32, &str)> = jobs.iter().map(|j| (j.step, j.field.as_str())).collect();
        assert_eq!(
            order,
            [(0, "t_2m"), (0, "clch"), (3, "t_2m"), (3, "clch"), (6, "t_2m"), (6, "clch")]
        );

        let first = &jobs[0];
        assert_eq!(
            first.url,
            "https://opendata.dwd.de/weather/nwp/icon-eu/grib/09/t_2m/icon-eu_europe_icosahedral_single-level_2020062609_000_T_2M.grib2.bz2"
        );
        assert_eq!(
            first.file_name,
            "icon-eu_europe_icosahedral_single-level_2020062609_000_T_2M.grib2"
        );
        assert_eq!(
            first.destination(),
            Path::new("/data/nwp/icon-eu_europe_icosahedral_single-level_2020062609_000_T_2M.grib2")
        );
        assert!(jobs[3].url.ends_with("_2020062609_003_CLCH.grib2.bz2"));
        assert!(jobs[4].url.contains("/grib/09/t_2m/"));
        assert!(jobs.iter().all(|job| job.grid == "icosahedral" && job.timestamp == run_time()));
    }

    #[test]
    fn unknown_grid_is_used_as_given() {
        let catalog = ModelCatalog::bundled().unwrap();
        let jobs = RequestExpander::new(&catalog)
            .expand(&request("icon", Some("lambert"), "t_2m", 0, 0, 1))
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].url.contains("icon_global_lambert_single-level"));
    }

    #[test]
    fn missing_grid_falls_back_to_first() {
        let catalog = ModelCatalog::bundled().unwrap();
        let jobs = RequestExpander::new(&catalog)
            .expand(&request("icon-d2", None, "t_2m", 0, 0, 1))
            .unwrap();
        assert_eq!(jobs[0].grid, "icosahedral");
        assert_eq!(
            jobs[0].file_name,
            "icon-d2_germany_icosahedral_single-level_2020062609_000_2d_t_2m.grib2"
        );
    }

    mod capture {
        use log::{Level, Log, Metadata, Record};
        use std::cell::RefCell;
        use std::sync::Once;

        thread_local! {
            static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
        }

        struct ThreadLogger;

        impl Log for ThreadLogger {
            fn enabled(&self, _: &Metadata) -> bool {
                true
            }

            fn log(&self, record: &Record) {
                RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
            }

            fn flush(&self) {}
        }

        static LOGGER: ThreadLogger = ThreadLogger;
        static INIT: Once = Once::new();

        /// Runs `f` and returns the warnings it logged on the current thread.
        pub(super) fn warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
            INIT.call_once(|| {
                log::set_logger(&LOGGER).unwrap();
                log::set_max_level(log::LevelFilter::Trace);
            });
            RECORDS.with(|r| r.borrow_mut().clear());
            let out = f();
            let warnings = RECORDS.with(|r| {
                r.borrow_mut()
                    .drain(..)
                    .filter(|(level, _)| *level == Level::Warn)
                    .map(|(_, message)| message)
                    .collect()
            });
            (out, warnings)
        }
    }

    #[test]
    fn unknown_grid_is_warned_about() {
        let catalog = ModelCatalog::bundled().unwrap();
        let expander = RequestExpander::new(&catalog);

        let (jobs, warnings) =
            capture::warnings(|| expander.expand(&request("icon", Some("lambert"), "t_2m", 0, 0, 1)));
        assert!(jobs.is_ok());
        assert_eq!(warnings, ["Unknown grid type 'lambert' for model 'icon'."]);

        let (jobs, warnings) = capture::warnings(|| {
            expander.expand(&request("icon", Some("icosahedral"), "t_2m", 0, 0, 1))
        });
        assert!(jobs.is_ok());
        assert!(warnings.is_empty());
    }

    #[test]
    fn grid_fallback_is_warned_about() {
        let catalog = ModelCatalog::bundled().unwrap();
        let expander = RequestExpander::new(&catalog);

        let (jobs, warnings) =
            capture::warnings(|| expander.expand(&request("icon-d2", None, "t_2m", 0, 0, 1)));
        assert!(jobs.is_ok());
        assert_eq!(
            warnings,
            [
                "No grid specified. Trying to use default.",
                "Grid type 'icosahedral' selected",
            ]
        );
    }

    #[test]
    fn unknown_model_fails() {
        let catalog = ModelCatalog::bundled().unwrap();
        let result = RequestExpander::new(&catalog).expand(&request("gfs", None, "t_2m", 0, 0, 1));
        assert!(matches!(
            result,
            Err(ExpandError::Catalog(CatalogError::UnknownModel(ref name))) if name == "gfs"
        ));
    }

    #[test]
    fn resolves_latest_run_when_no_timestamp() {
        let catalog = ModelCatalog::bundled().unwrap();
        let request = DownloadRequest::builder()
            .model("icon")
            .fields("t_2m")
            .directory("/tmp")
            .build()
            .unwrap();
        let now = Utc.with_ymd_and_hms(2020, 6, 26, 3, 0, 0).unwrap();

        let jobs = RequestExpander::new(&catalog).expand_at(&request, now).unwrap();
        // 03:00 minus 240 minutes is 23:00 the day before, the 18 UTC run.
        let expected = NaiveDate::from_ymd_opt(2020, 6, 25)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(jobs[0].timestamp, expected);
        assert!(jobs[0].url.contains("/grib/18/t_2m/icon_global_icosahedral_single-level_2020062518_000_T_2M"));
    }

    #[test]
    fn broken_pattern_is_reported() {
        let catalog = ModelCatalog::from_json_str(
            r#"[{ "model": "broken", "scope": "s", "intervalHours": 6, "grids": ["g"],
                  "pattern": { "single-level": "http://host/{model!l}.bz2" },
                  "openDataDeliveryOffsetMinutes": 0 }]"#,
        )
        .unwrap();
        let result =
            RequestExpander::new(&catalog).expand(&request("broken", None, "t_2m", 0, 0, 1));
        assert!(matches!(
            result,
            Err(ExpandError::Template {
                source: TemplateError::UnsupportedConversion { .. },
                ..
            })
        ));
    }

    #[test]
    fn missing_level_type_pattern_is_reported() {
        let catalog = ModelCatalog::from_json_str(
            r#"[{ "model": "bare", "scope": "s", "intervalHours": 6, "grids": ["g"],
                  "pattern": {}, "openDataDeliveryOffsetMinutes": 0 }]"#,
        )
        .unwrap();
        let result = RequestExpander::new(&catalog).expand(&request("bare", None, "t_2m", 0, 0, 1));
        assert!(matches!(result, Err(ExpandError::MissingPattern { .. })));
    }

    #[test]
    fn single_url() {
        let catalog = ModelCatalog::bundled().unwrap();
        let url = RequestExpander::new(&catalog)
            .grib_file_url("cosmo-d2", None, "clct", 27, run_time())
            .unwrap();
        assert_eq!(
            url,
            "https://opendata.dwd.de/weather/nwp/cosmo-d2/grib/09/clct/cosmo-d2_germany_rotated-lat-lon_single-level_2020062609_027_CLCT.grib2.bz2"
        );
    }

    #[test]
    fn file_name_strips_suffix_only() {
        assert_eq!(target_file_name("https://host/a/b/file.grib2.bz2"), "file.grib2");
        assert_eq!(target_file_name("https://host/a/b/file.grib2"), "file.grib2");
        assert_eq!(target_file_name("file.bz2"), "file");
    }
}
