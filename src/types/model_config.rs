//! Configuration of a single NWP model as published on the open data server.

use crate::catalog::error::CatalogError;
use crate::timestamp::is_valid_run_interval;
use crate::types::level_type::LevelType;
use bon::bon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Describes one model: where its files live and when its runs become available.
///
/// Instances are normally deserialized from a catalog definition file, which uses
/// camel-case keys:
///
/// ```json
/// {
///     "model": "icon",
///     "scope": "global",
///     "intervalHours": 6,
///     "grids": ["icosahedral"],
///     "pattern": { "single-level": "https://opendata.dwd.de/weather/nwp/{model!L}/..." },
///     "openDataDeliveryOffsetMinutes": 240
/// }
/// ```
///
/// # Examples
///
/// ```
/// use opendata_downloader::ModelConfig;
///
/// let config = ModelConfig::builder()
///     .model("icon")
///     .scope("global")
///     .interval_hours(6)
///     .grids(vec!["icosahedral".to_string()])
///     .pattern("{model!L}_{param!U}")
///     .open_data_delivery_offset_minutes(240)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.default_grid(), "icosahedral");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    model: String,
    scope: String,
    interval_hours: u32,
    grids: Vec<String>,
    pattern: BTreeMap<String, String>,
    open_data_delivery_offset_minutes: u32,
}

#[bon]
impl ModelConfig {
    /// Creates a validated model configuration with a single-level URL pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidModelDefinition`] if `grids` is empty or
    /// `interval_hours` does not divide a day into whole runs.
    #[builder]
    pub fn new(
        #[builder(into)] model: String,
        #[builder(into)] scope: String,
        interval_hours: u32,
        grids: Vec<String>,
        #[builder(into)] pattern: String,
        open_data_delivery_offset_minutes: u32,
    ) -> Result<Self, CatalogError> {
        let mut patterns = BTreeMap::new();
        patterns.insert(LevelType::SingleLevel.pattern_key().to_string(), pattern);
        let config = Self {
            model,
            scope,
            interval_hours,
            grids,
            pattern: patterns,
            open_data_delivery_offset_minutes,
        };
        config.validate()?;
        Ok(config)
    }
}

impl ModelConfig {
    pub(crate) fn validate(&self) -> Result<(), CatalogError> {
        if self.grids.is_empty() {
            return Err(self.invalid("grid list is empty"));
        }
        if !is_valid_run_interval(self.interval_hours) {
            return Err(self.invalid(&format!(
                "run interval of {} hours does not divide 24",
                self.interval_hours
            )));
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> CatalogError {
        CatalogError::InvalidModelDefinition {
            model: self.model.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.model
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Hours between two consecutive runs. Runs start at 00 UTC.
    pub fn interval_hours(&self) -> u32 {
        self.interval_hours
    }

    /// Minutes after a run's nominal hour before its data is reliably on the server.
    pub fn publication_delay_minutes(&self) -> u32 {
        self.open_data_delivery_offset_minutes
    }

    pub fn grids(&self) -> &[String] {
        &self.grids
    }

    /// The first configured grid, used whenever a request names none.
    pub fn default_grid(&self) -> &str {
        // validate() rejects empty grid lists, so this only falls back for hand-built values
        self.grids.first().map(String::as_str).unwrap_or_default()
    }

    pub fn supports_grid(&self, grid: &str) -> bool {
        self.grids.iter().any(|g| g == grid)
    }

    pub fn pattern_for(&self, level_type: LevelType) -> Option<&str> {
        self.pattern.get(level_type.pattern_key()).map(String::as_str)
    }
}
