use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unsupported conversion '!{conversion}' for field '{field}'")]
    UnsupportedConversion { field: String, conversion: String },

    #[error("Unsupported format spec '{spec}' for field '{field}'")]
    UnsupportedFormat { field: String, spec: String },

    #[error("No value for field '{0}'")]
    UnknownField(String),

    #[error("Malformed pattern at position {position}: {reason}")]
    MalformedPattern {
        position: usize,
        reason: &'static str,
    },
}
