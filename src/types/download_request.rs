use crate::expand::error::ExpandError;
use crate::types::level_type::LevelType;
use bon::bon;
use chrono::NaiveDateTime;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

/// Splits a comma separated field list, trimming each entry and dropping empty ones.
///
/// # Examples
///
/// ```
/// use opendata_downloader::parse_field_list;
///
/// assert_eq!(parse_field_list("t_2m, tmax_2m ,clch"), ["t_2m", "tmax_2m", "clch"]);
/// ```
pub fn parse_field_list(fields: &str) -> Vec<String> {
    fields
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}

/// A validated request for a range of forecast steps of one or more fields of a model.
///
/// # Examples
///
/// ```
/// use opendata_downloader::DownloadRequest;
///
/// let request = DownloadRequest::builder()
///     .model("icon-eu")
///     .fields("t_2m,clch")
///     .min_time_step(0)
///     .max_time_step(12)
///     .time_step_interval(3)
///     .directory("/tmp")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.fields(), ["t_2m", "clch"]);
/// assert_eq!(request.grid(), None);
/// assert_eq!(request.timestamp(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    model: String,
    grid: Option<String>,
    fields: Vec<String>,
    min_time_step: u32,
    max_time_step: u32,
    time_step_interval: NonZeroU32,
    timestamp: Option<NaiveDateTime>,
    directory: PathBuf,
    level_type: LevelType,
}

#[bon]
impl DownloadRequest {
    /// Creates a request.
    ///
    /// Defaults: no grid (the model's first grid is used), time steps `0..=min_time_step`
    /// with interval 1, no timestamp (the latest published run is resolved when the
    /// request is expanded), the current working directory, single-level fields.
    ///
    /// # Errors
    ///
    /// * [`ExpandError::NoFields`] if `fields` contains no names
    /// * [`ExpandError::InvalidTimeStepRange`] if `max_time_step < min_time_step`
    /// * [`ExpandError::ZeroTimeStepInterval`] if `time_step_interval` is 0
    /// * [`ExpandError::WorkingDirectory`] if no directory is given and the working
    ///   directory cannot be determined
    #[builder]
    pub fn new(
        #[builder(into)] model: String,
        #[builder(into)] grid: Option<String>,
        fields: &str,
        min_time_step: Option<u32>,
        max_time_step: Option<u32>,
        time_step_interval: Option<u32>,
        timestamp: Option<NaiveDateTime>,
        #[builder(into)] directory: Option<PathBuf>,
        level_type: Option<LevelType>,
    ) -> Result<Self, ExpandError> {
        let fields = parse_field_list(fields);
        if fields.is_empty() {
            return Err(ExpandError::NoFields);
        }

        let min_time_step = min_time_step.unwrap_or(0);
        let max_time_step = max_time_step.unwrap_or(min_time_step);
        if max_time_step < min_time_step {
            return Err(ExpandError::InvalidTimeStepRange {
                min: min_time_step,
                max: max_time_step,
            });
        }
        let time_step_interval = NonZeroU32::new(time_step_interval.unwrap_or(1))
            .ok_or(ExpandError::ZeroTimeStepInterval)?;

        let directory = match directory {
            Some(directory) => directory,
            None => std::env::current_dir().map_err(ExpandError::WorkingDirectory)?,
        };

        Ok(Self {
            model,
            grid,
            fields,
            min_time_step,
            max_time_step,
            time_step_interval,
            timestamp,
            directory,
            level_type: level_type.unwrap_or_default(),
        })
    }
}

impl DownloadRequest {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn grid(&self) -> Option<&str> {
        self.grid.as_deref()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn min_time_step(&self) -> u32 {
        self.min_time_step
    }

    pub fn max_time_step(&self) -> u32 {
        self.max_time_step
    }

    pub fn time_step_interval(&self) -> NonZeroU32 {
        self.time_step_interval
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn level_type(&self) -> LevelType {
        self.level_type
    }
}
