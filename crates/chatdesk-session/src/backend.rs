//! Seams between the session logic and the outside world: the chat backend
//! and the clock used for debouncing.

use async_trait::async_trait;
use chatdesk_types::{ChatId, ChatSummary, ChatTranscript, Credential, WireMessage};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single backend call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend no longer accepts the credential
    #[error("authentication rejected (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not reach backend: {0}")]
    Transport(String),

    #[error("unexpected response from backend: {0}")]
    Decode(String),
}

impl BackendError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        if status == 401 {
            BackendError::Unauthorized { status }
        } else {
            BackendError::Status {
                status,
                body: body.into(),
            }
        }
    }

    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, BackendError::Unauthorized { .. })
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// HTTP contract of the chat backend.
///
/// Futures are not required to be `Send`: the whole session runs on a single
/// cooperative scheduler (a browser event loop or a current-thread runtime).
#[async_trait(?Send)]
pub trait ChatBackend {
    /// `POST /login`
    async fn login(&self, email: &str, password: &str) -> BackendResult<Credential>;

    /// `GET /chats/`, or `GET /chats/?search=<q>` when `search` is non-empty
    async fn list_chats(
        &self,
        credential: &Credential,
        search: Option<&str>,
    ) -> BackendResult<Vec<ChatSummary>>;

    /// `GET /chats/{id}`
    async fn get_chat(&self, credential: &Credential, id: &ChatId) -> BackendResult<ChatTranscript>;

    /// `POST /chats/`
    async fn create_chat(&self, credential: &Credential, title: &str) -> BackendResult<ChatId>;

    /// `POST /chats/{id}/message`, returning the transcript the backend sends back
    async fn send_message(
        &self,
        credential: &Credential,
        id: &ChatId,
        content: &str,
    ) -> BackendResult<Vec<WireMessage>>;

    /// `POST /ask`: single turn, no conversation identity
    async fn ask(&self, message: &str) -> BackendResult<String>;
}

/// Timer used for the search debounce window
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}
