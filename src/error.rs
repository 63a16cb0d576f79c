/// Errors that end a command with exit code 1.
use crate::provider::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Bad or missing input, reported before any remote call.
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The call completed but the change did not take effect.
    #[error("{0}")]
    SoftFailure(String),
    #[error("{0}")]
    NotFound(String),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::Usage(message.into())
    }
}
