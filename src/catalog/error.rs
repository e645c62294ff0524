use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("Invalid definition for model '{model}': {reason}")]
    InvalidModelDefinition { model: String, reason: String },

    #[error("Model catalog contains no models")]
    EmptyCatalog,

    #[error("Failed to read model file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse model file '{0}'")]
    ParseFile(PathBuf, #[source] serde_json::Error),

    #[error("Failed to parse model definitions")]
    Parse(#[from] serde_json::Error),
}
