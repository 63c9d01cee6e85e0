use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for chatdesk
#[derive(Parser, Debug)]
#[command(name = "chatdesk")]
#[command(about = "chatdesk - terminal client for the chatdesk assistant")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the chat server (e.g., http://127.0.0.1:8000)
    #[arg(long, value_name = "URL")]
    pub server_url: Option<String>,

    /// Quiet period before a history search is sent, in milliseconds
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Directory for the saved session, config and logs (default: ~/.chatdesk)
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Path to config file (default: config.toml in the data directory)
    #[arg(long, value_name = "PATH", env = "CHATDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write every shown message to a JSONL transcript under <data-dir>/logs
    #[arg(long)]
    pub transcript_log: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        /// Account email (prompted for when omitted)
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// List saved conversations
    Chats {
        /// Only show conversations matching this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Ask a single question without starting a conversation
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}
