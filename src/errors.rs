use thiserror::Error;

use crate::domain::errors::{DomainError, PlaybackError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}
