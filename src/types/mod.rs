pub mod download_request;
pub mod failure_policy;
pub mod fetch_job;
pub mod level_type;
pub mod model_config;
pub mod run_timestamp;
