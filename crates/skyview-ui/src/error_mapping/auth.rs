use skyview_auth::AuthError;
use skyview_core::{AppError, AuthError as CoreAuthError};

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        let mapped = match e {
            AuthError::Provider(msg) => CoreAuthError::Rejected(msg),
            AuthError::Network(e) => CoreAuthError::Unreachable(e.to_string()),
            AuthError::InvalidResponse(msg) => {
                CoreAuthError::Unreachable(format!("Unexpected response: {}", msg))
            }
            AuthError::Storage(msg) => CoreAuthError::StorageError(msg),
            AuthError::MissingSession => CoreAuthError::NotSignedIn,
        };
        AppError::Auth(mapped)
    }
}
