//! Download and extract NWP model data in GRIB2 format from DWD's open data file server
//! <https://opendata.dwd.de>.
//!
//! Requests name a model, grid, fields and a range of forecast steps. They are expanded
//! into one [`FetchJob`] per (step, field) pair, with URLs rendered from the model's
//! pattern in the [`ModelCatalog`]. A [`GribFetcher`] downloads the jobs one after
//! another and stores the bzip2-decompressed files.

mod catalog;
mod downloader;
mod error;
mod expand;
mod fetch;
mod template;
mod timestamp;
mod types;
mod utils;

pub use downloader::{Downloader, DEFAULT_FIELDS};
pub use error::DownloaderError;
pub use utils::ensure_destination_dir;

pub use catalog::error::CatalogError;
pub use catalog::model_catalog::ModelCatalog;

pub use timestamp::{is_valid_run_interval, most_recent_run_timestamp};

pub use template::error::TemplateError;
pub use template::renderer::{render, UrlTemplate};
pub use template::value::{TemplateValue, TemplateValues};

pub use expand::error::ExpandError;
pub use expand::request_expander::{
    target_file_name, time_steps, RequestExpander, COMPRESSION_SUFFIX,
};

pub use fetch::error::FetchError;
pub use fetch::grib_fetcher::GribFetcher;

pub use types::download_request::{parse_field_list, DownloadRequest};
pub use types::failure_policy::{DownloadSummary, FailedJob, FailurePolicy};
pub use types::fetch_job::FetchJob;
pub use types::level_type::LevelType;
pub use types::model_config::ModelConfig;
pub use types::run_timestamp::IntoRunTimestamp;
