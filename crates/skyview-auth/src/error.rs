//! Identity gateway error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The identity provider rejected the request. The message is the
    /// provider's own text and is shown to the user verbatim.
    #[error("{0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Profile storage error: {0}")]
    Storage(String),

    #[error("Missing session")]
    MissingSession,
}
