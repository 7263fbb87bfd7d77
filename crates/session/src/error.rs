use storefront_http::ClientError;
use thiserror::Error;

/// Failures of the persistent token storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a session transition did not complete
///
/// Never returned by the controller's public methods; it only feeds the
/// diagnostics log.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Token storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Stored access token is expired and no refresh token is available")]
    Expired,

    #[error("No refresh token stored")]
    NoRefreshToken,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session changed while the request was in flight")]
    Superseded,
}
