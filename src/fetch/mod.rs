pub mod error;
pub mod grib_fetcher;
