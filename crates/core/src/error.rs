//! Error types shared by the core crate

/// Reasons a token payload could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token: expected 3 segments, found {segments}")]
    Malformed { segments: usize },

    #[error("Invalid base64 in token payload: {message}")]
    Base64 { message: String },

    #[error("Invalid claims JSON: {message}")]
    Json { message: String },
}

impl TokenError {
    /// Create a base64 error
    pub fn base64(message: impl Into<String>) -> Self {
        Self::Base64 {
            message: message.into(),
        }
    }

    /// Create a JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }
}
