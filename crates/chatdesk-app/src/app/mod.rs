pub mod commands;
pub mod repl;
pub mod session;

pub use commands::run_command;
pub use repl::{run_repl_mode, Flow, Repl, ReplCommand};
pub use session::Session;
