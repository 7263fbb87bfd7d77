//! Backend operations the session controller depends on

use async_trait::async_trait;
use storefront_core::{Credentials, ProfileUpdate, TokenPair, TokenRefresh, User};
use storefront_http::{ApiClient, ClientError};

/// Auth backend as seen by the session controller
///
/// Implemented by [`ApiClient`]; tests substitute stubs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Replace the bearer token used by subsequent requests
    fn set_token(&self, token: Option<String>);

    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ClientError>;

    async fn logout(&self) -> Result<(), ClientError>;

    async fn revoke(&self, refresh: &str) -> Result<(), ClientError>;

    async fn refresh_token(&self, refresh: &str) -> Result<TokenRefresh, ClientError>;

    async fn get_profile(&self) -> Result<User, ClientError>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ClientError>;
}

#[async_trait]
impl AuthGateway for ApiClient {
    fn set_token(&self, token: Option<String>) {
        Self::set_token(self, token);
    }

    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ClientError> {
        Self::login(self, credentials).await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        Self::logout(self).await
    }

    async fn revoke(&self, refresh: &str) -> Result<(), ClientError> {
        Self::revoke(self, refresh).await
    }

    async fn refresh_token(&self, refresh: &str) -> Result<TokenRefresh, ClientError> {
        Self::refresh_token(self, refresh).await
    }

    async fn get_profile(&self) -> Result<User, ClientError> {
        Self::get_profile(self).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ClientError> {
        Self::update_profile(self, update).await
    }
}
