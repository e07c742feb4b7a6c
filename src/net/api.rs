//! Backend Auth API seam.
//!
//! The session manager only ever talks to [`AuthApi`]; [`HttpAuthApi`] is the
//! production adapter over the shared [`ApiClient`]. Tests swap in scripted
//! implementations.
//!
//! ERROR HANDLING
//! ==============
//! Login and signup bodies are parsed on failure statuses too, so a `401`
//! carrying `{ "error": "Invalid credentials" }` reaches the caller as a
//! failed [`AuthResponse`] rather than an opaque status error.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::client::{ApiClient, Method};
use super::types::{ApiError, AuthResponse, LoginRequest, SignupRequest, User, parse_identity};

pub const ME_PATH: &str = "/api/auth/me";
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const SIGNUP_PATH: &str = "/api/auth/signup";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// "Who am I" for the current cookie session.
    async fn current_user(&self) -> Result<User, ApiError>;

    /// Exchange credentials for a session.
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;

    /// Create an account and start a session for it.
    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError>;

    /// End the server-side session.
    async fn logout(&self) -> Result<(), ApiError>;

    /// Session cookie worth persisting across processes, as a `Cookie`
    /// header value. Transports without cookies have none.
    fn session_cookie(&self) -> Option<String> {
        None
    }
}

pub struct HttpAuthApi {
    client: Arc<ApiClient>,
}

impl HttpAuthApi {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    async fn post_credentials<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<AuthResponse, ApiError> {
        let (status, text) = self.client.send_raw(Method::POST, path, Some(body)).await?;
        let ok = is_success(status);
        match serde_json::from_str::<AuthResponse>(&text) {
            Ok(mut response) => {
                if !ok {
                    response.success = false;
                }
                Ok(response)
            }
            Err(e) if ok => Err(ApiError::Parse(e.to_string())),
            Err(_) => Err(ApiError::Status { status, body: text }),
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn current_user(&self) -> Result<User, ApiError> {
        let (status, text) = self.client.send_raw(Method::GET, ME_PATH, None::<&()>).await?;
        if !is_success(status) {
            return Err(ApiError::Status { status, body: text });
        }
        parse_identity(&text)
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post_credentials(LOGIN_PATH, request).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        self.post_credentials(SIGNUP_PATH, request).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let (status, text) = self.client.send_raw(Method::POST, LOGOUT_PATH, None::<&()>).await?;
        if !is_success(status) {
            return Err(ApiError::Status { status, body: text });
        }
        Ok(())
    }

    fn session_cookie(&self) -> Option<String> {
        self.client.session_cookies()
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
