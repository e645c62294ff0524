pub mod error;
pub mod model_catalog;
