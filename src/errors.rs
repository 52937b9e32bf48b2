use std::path::PathBuf;

use thiserror::Error;

/// Startup failures while loading the exercise catalog. None of these are recoverable.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read exercise catalog `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("exercise catalog is not valid TOML: expected `[[exercise]]` entries")]
    Parse(#[from] toml::de::Error),

    #[error("exercise catalog contains no usable exercises")]
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("plan duration must be at least one day")]
    InvalidDuration,

    #[error("plan duration must be at most {max} days")]
    DurationTooLong { max: u32 },

    #[error("plan would run past the last representable date")]
    DateOutOfRange,
}
