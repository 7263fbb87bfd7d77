//! Session controller
//!
//! Owns the session state and is the only writer of both the persisted
//! tokens and the gateway's bearer token. Every state change goes through a
//! short synchronous commit section, so the store, the gateway and the
//! published state never disagree once a transition returns.
//!
//! Async transitions (`bootstrap`, `login`, `refresh`, `update_profile`,
//! `revoke_and_logout`) are queued one at a time. `logout` is synchronous
//! and can run while one of them is awaiting the network; it bumps an
//! epoch counter so the in-flight transition discards its result instead of
//! restoring the session that was just ended.
//!
//! The expiry check on bootstrap reads the unverified token payload. It only
//! saves a request that would fail anyway; the backend decides whether a
//! token is valid.

use crate::error::SessionError;
use crate::gateway::AuthGateway;
use crate::store::SessionStore;
use std::sync::{Arc, Mutex, PoisonError};
use storefront_core::{Credentials, ProfileUpdate, TokenPair, TokenRefresh, User, token};
use storefront_http::ClientError;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Snapshot of the session as seen by the rest of the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    /// Only true until the initial bootstrap finishes
    pub is_loading: bool,
}

impl SessionState {
    fn loading() -> Self {
        Self {
            user: None,
            token: None,
            is_loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Orchestrates login, logout and session restore
pub struct SessionController {
    gateway: Arc<dyn AuthGateway>,
    store: SessionStore,
    state: watch::Sender<SessionState>,
    transition: tokio::sync::Mutex<()>,
    /// Commit section; the value is the logout epoch
    commit: Mutex<u64>,
}

impl SessionController {
    /// Create a controller in the loading state without touching storage
    pub fn new(gateway: Arc<dyn AuthGateway>, store: SessionStore) -> Self {
        let (state, _) = watch::channel(SessionState::loading());
        Self {
            gateway,
            store,
            state,
            transition: tokio::sync::Mutex::new(()),
            commit: Mutex::new(0),
        }
    }

    /// Create a controller and restore any persisted session
    pub async fn start(gateway: Arc<dyn AuthGateway>, store: SessionStore) -> Self {
        let controller = Self::new(gateway, store);
        controller.bootstrap().await;
        controller
    }

    /// Current state
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified whenever the state actually changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Restore the persisted session, if any
    ///
    /// Without a stored access token no request is made. Any failure while
    /// restoring clears the stored tokens and leaves the session anonymous.
    pub async fn bootstrap(&self) {
        let _guard = self.transition.lock().await;
        let epoch = self.epoch();

        let outcome = self.restore(epoch).await;

        self.commit(|current| {
            let superseded = *current != epoch;
            match outcome {
                Ok(Some((token, user))) if !superseded => {
                    info!(username = %user.username, "Restored session");
                    self.publish(|state| {
                        state.user = Some(user);
                        state.token = Some(token);
                    });
                }
                Ok(None) => debug!("No session to restore"),
                Ok(Some(_)) | Err(SessionError::Superseded) => {
                    debug!("Session ended during restore");
                }
                Err(e) => {
                    warn!("Failed to restore session: {e}");
                    if !superseded {
                        self.discard_credentials();
                    }
                }
            }
            self.publish(|state| state.is_loading = false);
        });
    }

    async fn restore(&self, epoch: u64) -> Result<Option<(String, User)>, SessionError> {
        let Some(mut access) = self.store.access_token()? else {
            return Ok(None);
        };

        if token::is_expired(&access) {
            let refresh = self.store.refresh_token()?.ok_or(SessionError::Expired)?;
            debug!("Stored access token is expired, refreshing");
            let refreshed = self.gateway.refresh_token(&refresh).await?;
            self.commit(|current| {
                if *current != epoch {
                    return Err(SessionError::Superseded);
                }
                self.apply_refresh(&refreshed)
            })?;
            access = refreshed.access;
        } else {
            self.commit(|current| {
                if *current != epoch {
                    return Err(SessionError::Superseded);
                }
                self.gateway.set_token(Some(access.clone()));
                Ok(())
            })?;
        }

        let user = self.gateway.get_profile().await?;
        Ok(Some((access, user)))
    }

    /// Log in with a username and password
    ///
    /// Returns whether the session is now authenticated. Rejected
    /// credentials leave nothing persisted; if the profile cannot be loaded
    /// after tokens were issued, those tokens are discarded again.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let _guard = self.transition.lock().await;
        let epoch = self.epoch();

        info!(username, "Attempting login");
        match self.try_login(epoch, &Credentials::new(username, password)).await {
            Ok(()) => {
                info!(username, "Login successful");
                true
            }
            Err(e) => {
                log_failure("Login", &e);
                false
            }
        }
    }

    async fn try_login(&self, epoch: u64, credentials: &Credentials) -> Result<(), SessionError> {
        let pair = self.gateway.login(credentials).await?;

        self.commit(|current| {
            if *current != epoch {
                return Err(SessionError::Superseded);
            }
            self.store.set_tokens(&pair)?;
            self.gateway.set_token(Some(pair.access.clone()));
            Ok(())
        })?;

        debug!("Fetching user profile");
        let profile = self.gateway.get_profile().await;

        self.commit(|current| {
            // A logout in the meantime already cleaned up
            if *current != epoch {
                return Err(SessionError::Superseded);
            }
            match profile {
                Ok(user) => {
                    self.publish(|state| {
                        state.user = Some(user);
                        state.token = Some(pair.access);
                    });
                    Ok(())
                }
                Err(e) => {
                    self.discard_credentials();
                    Err(e.into())
                }
            }
        })
    }

    /// End the session locally
    ///
    /// Clears both stored tokens, detaches the bearer token and resets the
    /// state. Calling it while anonymous changes nothing.
    pub fn logout(&self) {
        self.commit(|epoch| {
            *epoch += 1;
            self.discard_credentials();
        });
    }

    /// Tell the backend the session is over, then [`logout`](Self::logout)
    ///
    /// The refresh token is revoked when one is stored. Backend failures are
    /// logged; the local logout always happens.
    pub async fn revoke_and_logout(&self) {
        let _guard = self.transition.lock().await;

        let refresh = self.store.refresh_token().unwrap_or_else(|e| {
            warn!("Could not read refresh token: {e}");
            None
        });

        let result = match refresh {
            Some(refresh) => Some(self.gateway.revoke(&refresh).await),
            None if self.token().is_some() => Some(self.gateway.logout().await),
            None => None,
        };
        if let Some(Err(e)) = result {
            warn!("Server-side logout failed: {e}");
        }

        self.logout();
    }

    /// Trade the stored refresh token for a new access token
    ///
    /// On failure the current session is left as it was.
    pub async fn refresh(&self) -> bool {
        let _guard = self.transition.lock().await;
        let epoch = self.epoch();

        match self.try_refresh(epoch).await {
            Ok(()) => {
                info!("Access token refreshed");
                true
            }
            Err(e) => {
                log_failure("Token refresh", &e);
                false
            }
        }
    }

    async fn try_refresh(&self, epoch: u64) -> Result<(), SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        let refresh = self
            .store
            .refresh_token()?
            .ok_or(SessionError::NoRefreshToken)?;

        let refreshed = self.gateway.refresh_token(&refresh).await?;

        self.commit(|current| {
            if *current != epoch {
                return Err(SessionError::Superseded);
            }
            self.apply_refresh(&refreshed)?;
            self.publish(|state| state.token = Some(refreshed.access.clone()));
            Ok(())
        })
    }

    /// Send a partial profile and replace the user with the server's answer
    pub async fn update_profile(&self, update: &ProfileUpdate) -> bool {
        let _guard = self.transition.lock().await;
        let epoch = self.epoch();

        if !self.is_authenticated() {
            log_failure("Profile update", &SessionError::NotAuthenticated);
            return false;
        }

        let result = self.gateway.update_profile(update).await;
        let outcome = self.commit(|current| {
            if *current != epoch {
                return Err(SessionError::Superseded);
            }
            let user = result?;
            self.publish(|state| state.user = Some(user));
            Ok(())
        });

        match outcome {
            Ok(()) => {
                info!("Profile updated");
                true
            }
            Err(e) => {
                log_failure("Profile update", &e);
                false
            }
        }
    }

    fn epoch(&self) -> u64 {
        *self.commit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit<R>(&self, f: impl FnOnce(&mut u64) -> R) -> R {
        let mut epoch = self.commit.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut epoch)
    }

    /// Persist and attach a refreshed access token; must run inside `commit`
    fn apply_refresh(&self, refreshed: &TokenRefresh) -> Result<(), SessionError> {
        match &refreshed.refresh {
            Some(rotated) => self.store.set_tokens(&TokenPair {
                access: refreshed.access.clone(),
                refresh: rotated.clone(),
            })?,
            None => self.store.set_access_token(&refreshed.access)?,
        }
        self.gateway.set_token(Some(refreshed.access.clone()));
        Ok(())
    }

    /// Forget every credential; must run inside `commit`
    fn discard_credentials(&self) {
        if let Err(e) = self.store.clear() {
            error!("Failed to clear stored tokens: {e}");
        }
        self.gateway.set_token(None);
        self.publish(|state| {
            state.user = None;
            state.token = None;
        });
    }

    fn publish(&self, f: impl FnOnce(&mut SessionState)) {
        self.state.send_if_modified(|state| {
            let before = state.clone();
            f(state);
            *state != before
        });
    }
}

fn log_failure(operation: &str, error: &SessionError) {
    match error {
        SessionError::Client(ClientError::Api { status, data }) => {
            warn!(status, %data, "{operation} rejected by server");
        }
        SessionError::Client(ClientError::Transport(e)) => {
            error!("{operation} failed, backend unreachable: {e}");
        }
        other => warn!("{operation} failed: {other}"),
    }
}
