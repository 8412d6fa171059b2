use taskping_common::error::AppError;
use thiserror::Error;

/// Failure of a single delivery attempt. The Display text is what callers
/// record after `failed: `.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("smtp: {0}")]
    Smtp(String),

    #[error("{0}")]
    Credentials(#[from] AppError),
}
