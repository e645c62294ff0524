use crate::catalog::error::CatalogError;
use crate::timestamp::most_recent_run_timestamp;
use crate::types::model_config::ModelConfig;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const BUNDLED_MODELS: &str = include_str!("models.json");

/// Registry of the models known to the downloader.
///
/// Built once at start-up, either from the bundled definitions or from an override
/// file, and read-only afterwards. An override replaces the bundled models entirely.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelConfig>,
    index: HashMap<String, usize>,
    grids: Vec<String>,
    grid_set: HashSet<String>,
}

impl ModelCatalog {
    /// Loads the model definitions shipped with the crate.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json_str(BUNDLED_MODELS)
    }

    /// Loads model definitions from a JSON file, replacing the bundled ones.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        info!("Loading model file from {}", path.display());
        let text = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Read(path.to_path_buf(), e))?;
        let models: Vec<ModelConfig> = serde_json::from_str(&text)
            .map_err(|e| CatalogError::ParseFile(path.to_path_buf(), e))?;
        Self::from_models(models)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let models: Vec<ModelConfig> = serde_json::from_str(json)?;
        Self::from_models(models)
    }

    /// Builds the name and grid indexes over a list of definitions.
    ///
    /// A later definition with an already seen name replaces the earlier one but keeps
    /// its position.
    pub fn from_models(definitions: Vec<ModelConfig>) -> Result<Self, CatalogError> {
        let mut models: Vec<ModelConfig> = Vec::with_capacity(definitions.len());
        let mut index = HashMap::new();
        let mut grids = Vec::new();
        let mut grid_set = HashSet::new();

        for model in definitions {
            model.validate()?;
            for grid in model.grids() {
                if grid_set.insert(grid.clone()) {
                    grids.push(grid.clone());
                }
            }
            match index.get(model.name()) {
                Some(&position) => {
                    warn!("Model '{}' is defined more than once, using the last definition", model.name());
                    models[position] = model;
                }
                None => {
                    index.insert(model.name().to_string(), models.len());
                    models.push(model);
                }
            }
        }

        if models.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        debug!("Loaded {} models with {} grids", models.len(), grids.len());

        Ok(Self {
            models,
            index,
            grids,
            grid_set,
        })
    }

    /// Looks up a model by its exact name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownModel`] if no model has this name.
    pub fn lookup(&self, model: &str) -> Result<&ModelConfig, CatalogError> {
        self.index
            .get(model)
            .map(|&position| &self.models[position])
            .ok_or_else(|| CatalogError::UnknownModel(model.to_string()))
    }

    /// Finds the canonical name of a model, ignoring ASCII case.
    pub fn find_model_ignore_case(&self, model: &str) -> Option<&str> {
        self.models
            .iter()
            .map(ModelConfig::name)
            .find(|name| name.eq_ignore_ascii_case(model))
    }

    /// The first model in definition order.
    pub fn default_model(&self) -> &ModelConfig {
        // from_models refuses to build an empty catalog
        &self.models[0]
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelConfig> {
        self.models.iter()
    }

    /// All model names in definition order.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(ModelConfig::name)
    }

    /// The union of all models' grids, in order of first appearance.
    pub fn grid_names(&self) -> impl Iterator<Item = &str> {
        self.grids.iter().map(String::as_str)
    }

    pub fn has_grid(&self, grid: &str) -> bool {
        self.grid_set.contains(grid)
    }

    /// Finds the canonical spelling of a known grid, ignoring ASCII case.
    pub fn find_grid_ignore_case(&self, grid: &str) -> Option<&str> {
        self.grid_names().find(|name| name.eq_ignore_ascii_case(grid))
    }

    /// Latest published run of `model`, as of now.
    pub fn most_recent_model_timestamp(&self, model: &str) -> Result<NaiveDateTime, CatalogError> {
        self.most_recent_model_timestamp_at(model, Utc::now())
    }

    /// Latest published run of `model` as of `now`, using the model's own run interval
    /// and publication delay.
    pub fn most_recent_model_timestamp_at(
        &self,
        model: &str,
        now: DateTime<Utc>,
    ) -> Result<NaiveDateTime, CatalogError> {
        let config = self.lookup(model)?;
        Ok(most_recent_run_timestamp(
            now,
            config.publication_delay_minutes(),
            config.interval_hours(),
        ))
    }
}
