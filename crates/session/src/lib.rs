//! Client-side authentication session for the storefront
//!
//! [`SessionController`] ties together the persisted tokens
//! ([`SessionStore`]) and the backend ([`AuthGateway`], implemented by
//! `storefront_http::ApiClient`), and publishes [`SessionState`] to whoever
//! renders it.

pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod storage;
pub mod store;

pub use config::StorageKeys;
pub use controller::{SessionController, SessionState};
pub use error::{SessionError, StorageError};
pub use gateway::AuthGateway;
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::SessionStore;
