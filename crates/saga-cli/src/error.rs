use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("failed to serialize the saga result to JSON")]
    Json(#[from] serde_json::Error),
}

pub(crate) type Result<T> = std::result::Result<T, CliError>;
