//! Error types for packagify.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sync and refactor runs.
///
/// Only fatal conditions travel through this type. Rule-level and file-level
/// problems are logged where they occur and never surface here.
#[derive(Error, Debug)]
pub enum PackagifyError {
    #[error("Config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to read config file: {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Clone failed for {repo}: {message}")]
    CloneError { repo: String, message: String },

    #[error("Branch operation failed: {message}")]
    BranchError { message: String },

    #[error("Push failed: {message}")]
    PushError { message: String },

    #[error("Git authentication failed: {message}")]
    GitAuth { message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PackagifyError {
    /// Returns true if this error comes from loading the configuration file.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PackagifyError::ConfigNotFound { .. }
                | PackagifyError::ConfigRead { .. }
                | PackagifyError::ConfigParse { .. }
        )
    }
}

/// A specialized Result type for packagify operations.
pub type Result<T> = std::result::Result<T, PackagifyError>;
