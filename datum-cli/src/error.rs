//! CLI error types.

use std::path::PathBuf;

use datum::FormError;

/// Errors reported by the command line driver.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to open '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid form definition: {0}")]
    Definition(#[from] serde_json::Error),

    #[error("failed to write form value: {0}")]
    Output(#[source] serde_json::Error),

    #[error("invalid --set argument '{0}': expected PATH=VALUE")]
    BadAssignment(String),

    #[error(transparent)]
    Form(#[from] FormError),
}
