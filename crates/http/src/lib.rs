//! Storefront HTTP module
//!
//! A thin JSON client for the storefront's JWT auth backend. It attaches the
//! current bearer token to every request and turns non-2xx answers into
//! [`ClientError::Api`]. Persisting tokens is left to the caller.

#[macro_use]
extern crate tracing;

pub mod client;

pub use client::error::ClientError;
pub use client::{ApiClient, ApiClientBuilder, RequestOptions};
