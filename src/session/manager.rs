//! Session manager: the single source of truth for the current user.
//!
//! ARCHITECTURE
//! ============
//! State lives in a `watch` channel. Every mutation is one synchronous
//! `send_modify`, so `user` and `is_authenticated` change together and
//! operations interleave only at their `.await` points. Overlapping calls
//! resolve last-write-wins; a login racing the initial check is not ordered.
//!
//! TRADE-OFFS
//! ==========
//! Login applies the server's answer before confirming it (phase 1) and then
//! re-checks "who am I" (phase 2). Phase 2 only logs; it never rolls back.

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use super::cache::{CachedIdentity, IdentityCache};
use super::state::SessionState;
use crate::net::api::{AuthApi, HttpAuthApi};
use crate::net::cache::ResponseCache;
use crate::net::client::ApiClient;
use crate::net::types::{ApiError, AuthResponse, LoginRequest, Role, SignupRequest, User};
use crate::storage::KeyValueStore;

pub const LOGIN_FAILED: &str = "Login failed";
pub const SIGNUP_FAILED: &str = "Signup failed";
pub const MISSING_CREDENTIALS: &str = "Email and password are required";
pub const MISSING_NAME: &str = "Name is required";

/// The only failure `login` and `signup` report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authentication failed: {message}")]
pub struct AuthError {
    message: String,
}

impl AuthError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Human-readable reason, suitable for an inline form error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    identity: IdentityCache,
    responses: Arc<ResponseCache>,
    state: watch::Sender<SessionState>,
    initialized: AtomicBool,
    torn_down: AtomicBool,
}

impl SessionManager {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn KeyValueStore>, responses: Arc<ResponseCache>) -> Self {
        let (state, _) = watch::channel(SessionState::unresolved());
        Self {
            api,
            identity: IdentityCache::new(store),
            responses,
            state,
            initialized: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Manager over the HTTP adapter, sharing `client`'s cookie session and
    /// response cache. A session cookie saved by an earlier process is loaded
    /// into `client` unless it already carries cookies.
    #[must_use]
    pub fn from_client(client: Arc<ApiClient>, store: Arc<dyn KeyValueStore>) -> Self {
        if client.session_cookies().is_none() {
            if let Some(cookie) = IdentityCache::new(store.clone()).load_cookie() {
                tracing::debug!("resuming saved session cookie");
                client.restore_cookies(&cookie);
            }
        }
        let responses = client.cache().clone();
        Self::new(Arc::new(HttpAuthApi::new(client)), store, responses)
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.borrow().loading()
    }

    /// Detach the owner. An `initialize` still in flight applies nothing after this.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
    }

    fn live(&self) -> bool {
        !self.torn_down.load(Ordering::SeqCst)
    }

    // =========================================================================
    // INITIALIZE
    // =========================================================================

    /// Resolve the initial session: server verification first, then the local
    /// identity cache. Runs once per manager; later calls are ignored.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::warn!("session initialize called more than once; ignoring");
            return;
        }

        let verified = self.api.current_user().await;
        if !self.live() {
            tracing::debug!("session torn down during initialize; discarding result");
            return;
        }

        let restored = match verified {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "session verified");
                self.identity.save(&user);
                Some(user)
            }
            Err(error) => {
                tracing::debug!(%error, "session verification failed; trying local identity cache");
                self.restore_cached()
            }
        };

        if !self.live() {
            return;
        }
        self.state.send_modify(|state| {
            if let Some(user) = restored {
                state.set_user(Some(user));
            }
            state.finish_loading();
        });
    }

    fn restore_cached(&self) -> Option<User> {
        match self.identity.load() {
            CachedIdentity::Found(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "restored unverified identity from local cache");
                Some(user)
            }
            CachedIdentity::Corrupt => {
                if self.live() {
                    self.identity.clear_user();
                }
                None
            }
            CachedIdentity::Missing => None,
        }
    }

    // =========================================================================
    // LOGIN / SIGNUP
    // =========================================================================

    /// Sign in with credentials and an optional role hint.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the credentials are empty, the request
    /// fails, or the response lacks `success: true` plus a user. The session
    /// is cleared in every failure case.
    pub async fn login(&self, email: &str, password: &str, role: Option<Role>) -> Result<User, AuthError> {
        let outcome = if email.trim().is_empty() || password.is_empty() {
            Err(AuthError::new(MISSING_CREDENTIALS))
        } else {
            let request = LoginRequest { email: email.to_owned(), password: password.to_owned(), role };
            accepted_user(self.api.login(&request).await, LOGIN_FAILED)
        };
        let user = match outcome {
            Ok(user) => user,
            Err(error) => {
                self.reject("login", &error);
                return Err(error);
            }
        };

        // Phase 1: the login response is authoritative.
        self.apply_identity(&user, "login");

        // Phase 2: best-effort confirmation. Never rolls back phase 1.
        self.confirm_session(&user).await;

        Ok(user)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Same contract as [`SessionManager::login`]; an empty name is also rejected.
    pub async fn signup(&self, email: &str, password: &str, name: &str, role: Role) -> Result<User, AuthError> {
        let outcome = if email.trim().is_empty() || password.is_empty() {
            Err(AuthError::new(MISSING_CREDENTIALS))
        } else if name.trim().is_empty() {
            Err(AuthError::new(MISSING_NAME))
        } else {
            let request = SignupRequest {
                email: email.to_owned(),
                password: password.to_owned(),
                name: name.to_owned(),
                role,
            };
            accepted_user(self.api.signup(&request).await, SIGNUP_FAILED)
        };

        match outcome {
            Ok(user) => {
                self.apply_identity(&user, "signup");
                Ok(user)
            }
            Err(error) => {
                self.reject("signup", &error);
                Err(error)
            }
        }
    }

    fn apply_identity(&self, user: &User, action: &'static str) {
        self.state.send_modify(|state| state.set_user(Some(user.clone())));
        self.identity.save(user);
        if let Some(cookie) = self.api.session_cookie() {
            self.identity.save_cookie(&cookie);
        }
        let dropped = self.responses.clear();
        tracing::info!(user_id = %user.id, role = %user.role, dropped_responses = dropped, "{action} succeeded");
    }

    async fn confirm_session(&self, user: &User) {
        match self.api.current_user().await {
            Ok(confirmed) if confirmed.id == user.id => {
                tracing::debug!(user_id = %user.id, "session confirmed");
            }
            Ok(confirmed) => {
                tracing::warn!(
                    expected = %user.id,
                    confirmed = %confirmed.id,
                    "session confirmation returned a different user; keeping login response"
                );
            }
            Err(error) => {
                tracing::warn!(%error, user_id = %user.id, "session confirmation failed; keeping login state");
            }
        }
    }

    fn reject(&self, action: &'static str, error: &AuthError) {
        self.state.send_modify(|state| state.set_user(None));
        self.identity.clear_user();
        self.responses.clear();
        tracing::info!(reason = error.message(), "{action} rejected; session cleared");
    }

    // =========================================================================
    // LOGOUT
    // =========================================================================

    /// Sign out. Always ends anonymous with the identity cache wiped, whatever
    /// the server says.
    pub async fn logout(&self) {
        if let Err(error) = self.api.logout().await {
            tracing::warn!(%error, "server logout failed; clearing local session anyway");
        }
        self.state.send_modify(|state| state.set_user(None));
        self.identity.clear_all();
        let dropped = self.responses.clear();
        tracing::info!(dropped_responses = dropped, "logged out");
    }
}

/// Demand `success: true` plus a user; anything else is a failure.
fn accepted_user(result: Result<AuthResponse, ApiError>, fallback: &str) -> Result<User, AuthError> {
    match result {
        Ok(response) => match response.accepted_user() {
            Some(user) => Ok(user.clone()),
            None => Err(AuthError::new(response.failure_message().unwrap_or(fallback))),
        },
        Err(error) => {
            tracing::warn!(%error, "auth request failed");
            Err(AuthError::new(fallback))
        }
    }
}
