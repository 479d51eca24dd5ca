use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// The snapshot handed to a job cannot be analysed.
    #[error("invalid job input: {0}")]
    InvalidInput(String),

    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// The remote inference backend could not be reached or answered badly.
    #[error("analytics backend unavailable: {0}")]
    Unavailable(String),
}
