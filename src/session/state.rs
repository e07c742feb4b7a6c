//! In-memory session record.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use crate::net::types::{Role, User};

/// Coarse lifecycle position of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// The initial session check has not resolved yet.
    Unresolved,
    Anonymous,
    Authenticated,
}

/// Snapshot of the session as seen by consumers.
///
/// `is_authenticated` is computed from `user` at the moment `user` is set and
/// the two are only ever written together, so they cannot disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    user: Option<User>,
    is_authenticated: bool,
    loading: bool,
}

impl SessionState {
    /// Fresh state at process start: no user, initial check pending.
    #[must_use]
    pub fn unresolved() -> Self {
        Self { user: None, is_authenticated: false, loading: true }
    }

    /// Resolved state with no user.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None, is_authenticated: false, loading: false }
    }

    /// Resolved state for `user`.
    #[must_use]
    pub fn authenticated(user: User) -> Self {
        Self { user: Some(user), is_authenticated: true, loading: false }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Lifecycle phase. Anything observed before the initial check resolves
    /// is `Unresolved`, even if a login already landed.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Unresolved
        } else if self.is_authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }

    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    #[must_use]
    pub fn is_tutor(&self) -> bool {
        self.has_role(Role::Tutor)
    }

    #[must_use]
    pub fn is_student(&self) -> bool {
        self.has_role(Role::Student)
    }

    /// Replace the user wholesale.
    pub(crate) fn set_user(&mut self, user: Option<User>) {
        self.is_authenticated = user.is_some();
        self.user = user;
    }

    /// Mark the initial check resolved. Returns whether this call did it.
    pub(crate) fn finish_loading(&mut self) -> bool {
        std::mem::replace(&mut self.loading, false)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::unresolved()
    }
}
