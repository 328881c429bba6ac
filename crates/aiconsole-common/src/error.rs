use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The conversation log store is unreachable or rejected an operation.
    #[error("database error: {0}")]
    Database(String),

    /// The completion or transcription backend failed, or replied without
    /// usable content.
    #[error("service error: {0}")]
    Service(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("config error: {0}")]
    Config(String),

    /// The client request failed validation before any work was done.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
