//! Client-side chat session logic for chatdesk
//!
//! This crate holds everything that does not depend on where the client runs:
//! the token store, debounced history search, the chat session controller and
//! the view model derived from it. Front ends supply a [`ChatBackend`], a
//! [`Sleeper`] and a [`CredentialPersistence`].

pub mod backend;
pub mod controller;
pub mod conversation;
pub mod gate;
pub mod quick_ask;
pub mod search;
pub mod token_store;
pub mod view;

pub use backend::{BackendError, BackendResult, ChatBackend, Sleeper};
pub use controller::{
    ChatController, CommandOutcome, IgnoreReason, LoginError, SessionSnapshot, SessionStatus,
};
pub use conversation::{Conversation, Message, CONNECT_ERROR_MARKER, MISSING_REPLY_MARKER};
pub use gate::{Operation, RequestGate};
pub use quick_ask::QuickAsk;
pub use search::{HistorySearch, SearchOutcome, SearchTicket, DEFAULT_DEBOUNCE};
pub use token_store::{CredentialPersistence, MemoryPersistence, TokenStore};
pub use view::{render_session, ChatView, SidebarItem, ViewItem};

// Re-export the wire types front ends need alongside the session API
pub use chatdesk_types::{ChatId, ChatSummary, Credential, Role};
