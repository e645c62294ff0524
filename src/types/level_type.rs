//! Vertical level categories of model fields.

use std::fmt;

/// The vertical-level category a field belongs to.
///
/// Each category has its own URL pattern in a [`crate::ModelConfig`]. Only
/// single-level fields (2 m temperature, total cloud cover, mean sea level
/// pressure, ...) are currently downloadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LevelType {
    /// Fields defined on a single surface, e.g. `t_2m`, `clch`, `pmsl`.
    #[default]
    SingleLevel,
}

impl LevelType {
    /// Key of this level type in a model's `pattern` map. Also substituted for
    /// `{levtype}` in URL patterns.
    pub(crate) fn pattern_key(&self) -> &'static str {
        match self {
            LevelType::SingleLevel => "single-level",
        }
    }
}

/// Formats a `LevelType` using its pattern key.
///
/// # Examples
///
/// ```
/// use opendata_downloader::LevelType;
///
/// assert_eq!(LevelType::SingleLevel.to_string(), "single-level");
/// ```
impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern_key())
    }
}
