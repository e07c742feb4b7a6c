//! Route guard for protected views.
//!
//! A pure decision over a [`SessionState`] snapshot: wait, redirect, or
//! render. Callers own the navigation itself.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::borrow::Cow;

use super::state::SessionState;
use crate::net::types::Role;

/// Where unauthenticated visitors are sent by default.
pub const LOGIN_PATH: &str = "/auth/login";

/// Outcome of checking a session against a guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access<'a> {
    /// The initial session check is still running; show a spinner.
    Pending,
    Granted,
    Redirect(&'a str),
}

/// Landing page for each role.
#[must_use]
pub fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::Tutor => "/tutor/dashboard",
        Role::Student => "/student/dashboard",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteGuard {
    required_role: Option<Role>,
    fallback_path: Cow<'static, str>,
}

impl RouteGuard {
    /// Guard that only requires a signed-in user.
    #[must_use]
    pub fn new() -> Self {
        Self { required_role: None, fallback_path: Cow::Borrowed(LOGIN_PATH) }
    }

    /// Guard that also requires `role`.
    #[must_use]
    pub fn requiring(role: Role) -> Self {
        Self { required_role: Some(role), ..Self::new() }
    }

    #[must_use]
    pub fn with_fallback(self, fallback_path: impl Into<Cow<'static, str>>) -> Self {
        Self { fallback_path: fallback_path.into(), ..self }
    }

    #[must_use]
    pub fn required_role(&self) -> Option<Role> {
        self.required_role
    }

    /// Decide access for `state`. A user with the wrong role goes to their own
    /// dashboard rather than the login page.
    #[must_use]
    pub fn check(&self, state: &SessionState) -> Access<'_> {
        if state.loading() {
            return Access::Pending;
        }
        let Some(user) = state.user() else {
            return Access::Redirect(&self.fallback_path);
        };
        match self.required_role {
            Some(required) if required != user.role => Access::Redirect(dashboard_path(user.role)),
            _ => Access::Granted,
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}
