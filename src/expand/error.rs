use crate::catalog::error::CatalogError;
use crate::template::error::TemplateError;
use crate::types::level_type::LevelType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpandError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to render URL pattern of model '{model}'")]
    Template {
        model: String,
        #[source]
        source: TemplateError,
    },

    #[error("Model '{model}' has no URL pattern for {level_type} fields")]
    MissingPattern { model: String, level_type: LevelType },

    #[error("No fields requested")]
    NoFields,

    #[error("Maximum time step {max} is smaller than minimum time step {min}")]
    InvalidTimeStepRange { min: u32, max: u32 },

    #[error("Time step interval must be at least 1")]
    ZeroTimeStepInterval,

    #[error("Failed to determine working directory")]
    WorkingDirectory(#[source] std::io::Error),
}
