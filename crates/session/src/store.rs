//! Access/refresh token persistence

use crate::config::StorageKeys;
use crate::error::StorageError;
use crate::storage::StorageBackend;
use std::sync::Arc;
use storefront_core::TokenPair;

/// Reads and writes the two session tokens under fixed keys
///
/// No encryption and no expiry handling; this is purely persistence.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
    keys: StorageKeys,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_keys(backend, StorageKeys::default())
    }

    pub fn with_keys(backend: Arc<dyn StorageBackend>, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.backend.get_item(self.keys.access.as_str())
    }

    pub fn set_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.backend
            .set_items(&[(self.keys.access.as_str(), token)])
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.backend.get_item(self.keys.refresh.as_str())
    }

    pub fn set_refresh_token(&self, token: &str) -> Result<(), StorageError> {
        self.backend
            .set_items(&[(self.keys.refresh.as_str(), token)])
    }

    /// Persist both tokens in one write
    pub fn set_tokens(&self, pair: &TokenPair) -> Result<(), StorageError> {
        self.backend.set_items(&[
            (self.keys.access.as_str(), pair.access.as_str()),
            (self.keys.refresh.as_str(), pair.refresh.as_str()),
        ])
    }

    /// Remove both tokens in one write
    pub fn clear(&self) -> Result<(), StorageError> {
        self.backend
            .remove_items(&[self.keys.access.as_str(), self.keys.refresh.as_str()])
    }
}
