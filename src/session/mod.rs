//! Session layer: who the current user is, and how that changes.
//!
//! SYSTEM CONTEXT
//! ==============
//! One [`SessionManager`] per running application, shared by `Arc` and handed
//! explicitly to every consumer. Protected views read its state through
//! [`guard::RouteGuard`] to decide between a spinner, a redirect, or rendering.

pub mod cache;
pub mod guard;
pub mod manager;
pub mod state;

pub use guard::{Access, RouteGuard};
pub use manager::{AuthError, SessionManager};
pub use state::{SessionPhase, SessionState};
