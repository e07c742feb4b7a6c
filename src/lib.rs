//! # academia
//!
//! Client-side session core for the Academia tutoring platform.
//!
//! The crate answers one question for the rest of the application: who is
//! the current user. It reconciles the server-verified cookie session with a
//! best-effort local identity cache and exposes `initialize`, `login`,
//! `signup`, and `logout` through a single [`SessionManager`].
//!
//! Layout:
//! - [`net`]: wire types, the shared HTTP client, and the Backend Auth API seam.
//! - [`storage`]: persisted key-value stores (the local-storage analogue).
//! - [`session`]: session state, the manager, and the route guard.
//! - [`config`]: environment-driven client configuration.

pub mod config;
pub mod net;
pub mod session;
pub mod storage;

#[cfg(test)]
#[path = "mock_backend_test.rs"]
mod mock_backend;

pub use config::ClientConfig;
pub use net::types::{Role, User};
pub use session::{AuthError, SessionManager, SessionPhase, SessionState};
