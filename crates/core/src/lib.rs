//! Storefront core types and utilities

pub mod error;
pub mod token;
pub mod types;

pub use error::TokenError;
pub use token::{decode, expires_at, is_expired, is_expired_at};
pub use types::{
    Claims, Credentials, ProfileUpdate, RegisterRequest, Registration, TokenPair, TokenRefresh,
    User,
};
