//! Error types shared across the crate.

use std::path::PathBuf;

/// A bracketed literal that is not the kind of value the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("not a color: {0}")]
    NotAColor(String),

    #[error("not a dimension: {0}")]
    NotADimension(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("invalid extension pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ColorApiError {
    #[error("color api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid color api response: {0}")]
    InvalidResponse(String),
}

/// Rejection from the constrained config-object parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct ObjectParseError {
    pub message: String,
    pub offset: usize,
}

/// Fatal errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to fetch color catalog: {0}")]
    Catalog(#[from] ColorApiError),
}

/// Every color naming path came up empty for this hex.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no name found for #{0}")]
pub struct NoNameFound(pub String);
