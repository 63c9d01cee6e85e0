//! HTTP client for the chatdesk backend
//!
//! Implements [`chatdesk_session::ChatBackend`] on top of reqwest for native
//! front ends. The browser build talks to the same endpoints through its own
//! fetch based backend.

pub mod http_backend;

pub use http_backend::{normalize_base_url, HttpBackend, DEFAULT_SERVER_URL};
