//! Worker configuration errors.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating worker configuration.
#[derive(Debug, Error)]
pub enum WorkerConfigError {
    /// The configuration file could not be read.
    #[error("failed to read worker config {path}: {source}")]
    Read {
        /// File that was read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid JSON of the expected shape.
    #[error("failed to parse worker config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The agent command is blank.
    #[error("agent command must not be empty")]
    EmptyAgent,

    /// The argument template is blank.
    #[error("agent argument template must not be empty")]
    EmptyArgsTemplate,

    /// The argument template does not compile.
    #[error("invalid agent argument template: {0}")]
    InvalidArgsTemplate(#[source] minijinja::Error),

    /// The poll interval is zero.
    #[error("poll interval must be at least one second")]
    ZeroPollInterval,
}
