//! Network layer for the Backend Auth API and general REST calls.
//!
//! DESIGN
//! ======
//! Every request goes through one shared [`client::ApiClient`] so the
//! session cookie issued at login rides along on later calls without the
//! session layer ever touching it.

pub mod api;
pub mod cache;
pub mod client;
pub mod types;
