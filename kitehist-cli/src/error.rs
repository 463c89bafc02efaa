use kitehist::KiteError;
use thiserror::Error;

/// Failures reported as `ERROR: ...` with exit status 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("--app value is required")]
    MissingApp,

    #[error("Unrecognized --app value")]
    UnrecognizedApp,

    #[error("{0}")]
    Argument(String),

    #[error(transparent)]
    Kite(#[from] KiteError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
