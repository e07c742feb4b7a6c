//! Wire DTOs for the Backend Auth API and the shared API error type.
//!
//! DESIGN
//! ======
//! Backends in the field disagree on small details (numeric vs string ids,
//! wrapped vs bare identity payloads), so the deserializers here accept both
//! shapes and normalize them. Anything else is a malformed payload.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// IDENTITY
// =============================================================================

/// Platform role attached to every account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    /// Lowercase wire name (`"student"`, `"tutor"`, `"admin"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Tutor => "tutor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role name does not match any known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}' (expected student, tutor, or admin)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "tutor" => Ok(Self::Tutor),
            "admin" => Ok(Self::Admin),
            _ => Err(UnknownRole(raw.to_owned())),
        }
    }
}

/// Session identity of the signed-in account.
///
/// Treated as immutable once received; the session layer only ever replaces
/// it wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier. Backends send either a number or a string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub email: String,
    /// Display name. Some login responses omit it.
    #[serde(default)]
    pub name: String,
    pub role: Role,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(id) if !id.is_empty() => Ok(id),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        _ => Err(D::Error::custom("expected non-empty string or number id")),
    }
}

/// Body of `GET /api/auth/me`: either `{ "user": {...} }` or a bare user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdentityPayload {
    Wrapped { user: User },
    Bare(User),
}

/// Parse a "who am I" response body into a user.
///
/// # Errors
///
/// Returns [`ApiError::Parse`] when the body is neither shape.
pub fn parse_identity(body: &str) -> Result<User, ApiError> {
    let payload: IdentityPayload = serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    Ok(match payload {
        IdentityPayload::Wrapped { user } | IdentityPayload::Bare(user) => user,
    })
}

// =============================================================================
// REQUESTS / RESPONSES
// =============================================================================

/// `POST /api/auth/login` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Role hint for role-scoped authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// `POST /api/auth/signup` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

/// Response shape shared by login and signup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    /// The user, but only when the response also reports success.
    #[must_use]
    pub fn accepted_user(&self) -> Option<&User> {
        if self.success { self.user.as_ref() } else { None }
    }

    /// Backend-provided failure text, if any non-blank one was sent.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        [self.error.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Failure talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {message}")]
    Request { message: String, retryable: bool },

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether a retry of an idempotent request could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request { retryable: true, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request { retryable: error.is_timeout() || error.is_connect(), message: error.to_string() }
    }
}
