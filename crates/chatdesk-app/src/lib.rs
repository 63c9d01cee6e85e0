//! chatdesk terminal client
//!
//! Wires the session controller to the HTTP backend, a file-backed token
//! store and a rustyline REPL.

// Re-export workspace crates
pub use chatdesk_api as api;
pub use chatdesk_logging as logging;
pub use chatdesk_session as session;
pub use chatdesk_types as types;

// Local modules
pub mod app;
pub mod cli;
pub mod config;
pub mod credential_file;
pub mod render;
pub mod sleeper;

pub use app::{run_command, run_repl_mode, Session};
pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use credential_file::FileCredentialStore;
pub use sleeper::TokioSleeper;
