//! Session storage configuration

use serde::{Deserialize, Serialize};

/// Storage key of the access token
pub const DEFAULT_ACCESS_TOKEN_KEY: &str = "authToken";

/// Storage key of the refresh token
pub const DEFAULT_REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Names under which the two tokens are persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub access: String,
    pub refresh: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access: DEFAULT_ACCESS_TOKEN_KEY.to_string(),
            refresh: DEFAULT_REFRESH_TOKEN_KEY.to_string(),
        }
    }
}
