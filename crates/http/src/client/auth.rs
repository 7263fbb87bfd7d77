//! Authentication API client methods

use super::config::Endpoints;
use super::{ApiClient, ClientError, RequestOptions};
use serde::de::IgnoredAny;
use serde_json::json;
use storefront_core::{
    Credentials, ProfileUpdate, RegisterRequest, Registration, TokenPair, TokenRefresh, User,
};

impl ApiClient {
    /// Exchange credentials for an access/refresh pair
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ClientError> {
        let options = RequestOptions::post().json(credentials)?;
        self.request(Endpoints::LOGIN, options).await
    }

    /// Create an account
    pub async fn register(&self, request: &RegisterRequest) -> Result<Registration, ClientError> {
        let options = RequestOptions::post().json(request)?;
        self.request(Endpoints::REGISTER, options).await
    }

    /// Tell the backend the session is over; any response body is ignored
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.request::<IgnoredAny>(Endpoints::LOGOUT, RequestOptions::post())
            .await?;
        Ok(())
    }

    /// Logout that also blacklists the given refresh token
    pub async fn revoke(&self, refresh: &str) -> Result<(), ClientError> {
        let options = RequestOptions::post().json(&json!({ "refresh": refresh }))?;
        self.request::<IgnoredAny>(Endpoints::LOGOUT, options).await?;
        Ok(())
    }

    /// Mint a new access token from a refresh token
    pub async fn refresh_token(&self, refresh: &str) -> Result<TokenRefresh, ClientError> {
        let options = RequestOptions::post().json(&json!({ "refresh": refresh }))?;
        self.request(Endpoints::REFRESH_TOKEN, options).await
    }

    /// Get the current user's profile (requires authentication)
    pub async fn get_profile(&self) -> Result<User, ClientError> {
        self.request(Endpoints::PROFILE, RequestOptions::get()).await
    }

    /// Update the current user's profile (requires authentication)
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ClientError> {
        let options = RequestOptions::put().json(update)?;
        self.request(Endpoints::PROFILE, options).await
    }
}
