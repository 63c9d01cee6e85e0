//! Chat session controller.
//!
//! Owns the active conversation and drives every backend call made on behalf
//! of the user. All methods take `&self`: the controller is shared through an
//! `Rc` by the front end, and a debounce can be waiting while a send is in
//! flight. No `RefCell` borrow is ever held across an `.await`.

use chatdesk_types::{provisional_title, ChatId, ChatSummary, Credential, Role, WireMessage};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

use crate::backend::{BackendError, BackendResult, ChatBackend, Sleeper};
use crate::conversation::{Conversation, Message, CONNECT_ERROR_MARKER, MISSING_REPLY_MARKER};
use crate::gate::{Operation, RequestGate};
use crate::search::{HistorySearch, SearchOutcome, SearchTicket, DEFAULT_DEBOUNCE};
use crate::token_store::TokenStore;

/// Notice shown when the history list could not be refreshed
pub const HISTORY_ERROR_NOTICE: &str = "Could not load chat history.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    /// Signed in with no send or load outstanding. A history fetch may
    /// still hold the gate; see [`SessionSnapshot::in_flight`].
    Idle,
    Sending,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyInput,
    Busy,
    NotSignedIn,
}

/// Result of a user command. Failures are already reflected in the session
/// state (inline error message or notice) by the time this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    Ignored(IgnoreReason),
    Failed(String),
    /// The backend rejected the credential and the session was ended
    SignedOut,
    /// The session ended (logout) while the request was in flight
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Email and password are required.")]
    MissingCredentials,
    #[error("Login failed. Please check your credentials.")]
    Rejected,
    #[error("Could not reach the server: {0}")]
    Unreachable(String),
    #[error("A sign-in is already in progress.")]
    Busy,
}

/// Everything the presentation layer needs, copied out of the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub conversation: Conversation,
    pub history: Vec<ChatSummary>,
    pub query: String,
    pub notice: Option<String>,
    pub user: Option<String>,
    /// Request currently holding the gate, whatever its kind
    pub in_flight: Option<Operation>,
}

struct ControllerState {
    status: SessionStatus,
    conversation: Conversation,
    notice: Option<String>,
    /// Bumped whenever the session is torn down, so responses that arrive
    /// afterwards can tell they no longer belong.
    epoch: u64,
}

struct Delivery {
    created: bool,
    result: BackendResult<Vec<WireMessage>>,
}

pub struct ChatController {
    backend: Rc<dyn ChatBackend>,
    tokens: Rc<TokenStore>,
    sleeper: Rc<dyn Sleeper>,
    search: HistorySearch,
    gate: RequestGate,
    state: RefCell<ControllerState>,
}

impl ChatController {
    pub fn new(
        backend: Rc<dyn ChatBackend>,
        tokens: Rc<TokenStore>,
        sleeper: Rc<dyn Sleeper>,
    ) -> Self {
        Self {
            backend,
            tokens,
            sleeper,
            search: HistorySearch::new(DEFAULT_DEBOUNCE),
            gate: RequestGate::new(),
            state: RefCell::new(ControllerState {
                status: SessionStatus::Unauthenticated,
                conversation: Conversation::draft(),
                notice: None,
                epoch: 0,
            }),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.search = HistorySearch::new(debounce);
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status
    }

    pub fn conversation(&self) -> Conversation {
        self.state.borrow().conversation.clone()
    }

    pub fn notice(&self) -> Option<String> {
        self.state.borrow().notice.clone()
    }

    pub fn history(&self) -> Vec<ChatSummary> {
        self.search.results()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn search(&self) -> &HistorySearch {
        &self.search
    }

    /// Whether any backend request is outstanding
    pub fn in_flight(&self) -> Option<Operation> {
        self.gate.current()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.borrow();
        SessionSnapshot {
            status: state.status,
            conversation: state.conversation.clone(),
            history: self.search.results(),
            query: self.search.query(),
            notice: state.notice.clone(),
            user: self.tokens.get().map(|c| c.display_name()),
            in_flight: self.gate.current(),
        }
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Enter the session if the token store already holds a credential
    /// (e.g. one saved by an earlier run). Returns whether signed in.
    pub async fn resume(&self) -> bool {
        if !self.tokens.is_present() {
            self.state.borrow_mut().status = SessionStatus::Unauthenticated;
            return false;
        }
        if self.status() != SessionStatus::Unauthenticated {
            return true;
        }
        self.enter_session().await;
        true
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), LoginError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let result = {
            let Some(_guard) = self.gate.try_acquire(Operation::Login) else {
                return Err(LoginError::Busy);
            };
            self.backend.login(email, password).await
        };

        match result {
            Ok(credential) => {
                log::info!("Signed in as {}", credential.display_name());
                self.tokens.set(credential);
                self.enter_session().await;
                Ok(())
            }
            Err(BackendError::Transport(reason)) => {
                log::warn!("Login request failed: {}", reason);
                Err(LoginError::Unreachable(reason))
            }
            Err(e) => {
                log::warn!("Login rejected: {}", e);
                Err(LoginError::Rejected)
            }
        }
    }

    /// End the session: forget the credential, drop back to an empty draft.
    /// Safe to call any number of times.
    pub fn logout(&self) {
        self.tokens.clear();
        self.search.reset();
        let mut state = self.state.borrow_mut();
        if state.status != SessionStatus::Unauthenticated {
            log::info!("Session ended");
        }
        state.status = SessionStatus::Unauthenticated;
        state.conversation = Conversation::draft();
        state.notice = None;
        state.epoch += 1;
    }

    async fn enter_session(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.status = SessionStatus::Idle;
            state.conversation = Conversation::draft();
            state.notice = None;
        }
        self.search.set_query("");
        self.refresh_history().await;
    }

    /// Credential for a new request, enforcing that a missing credential
    /// always means `Unauthenticated`.
    fn session_credential(&self) -> Option<Credential> {
        match self.tokens.get() {
            Some(credential) if self.status() != SessionStatus::Unauthenticated => Some(credential),
            Some(_) => None,
            None => {
                if self.status() != SessionStatus::Unauthenticated {
                    self.logout();
                }
                None
            }
        }
    }

    fn is_epoch(&self, epoch: u64) -> bool {
        self.state.borrow().epoch == epoch
    }

    // ------------------------------------------------------------------
    // Conversation commands
    // ------------------------------------------------------------------

    /// Drop back to an empty draft without touching the backend
    pub fn new_chat(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.status != SessionStatus::Idle {
            return false;
        }
        state.conversation = Conversation::draft();
        state.notice = None;
        true
    }

    /// Replace the active conversation with the backend's transcript of `id`
    pub async fn open_conversation(&self, id: &ChatId) -> CommandOutcome {
        let Some(credential) = self.session_credential() else {
            return CommandOutcome::Ignored(IgnoreReason::NotSignedIn);
        };

        let (epoch, result) = {
            let Some(_guard) = self.gate.try_acquire(Operation::Load) else {
                return CommandOutcome::Ignored(IgnoreReason::Busy);
            };
            let epoch = {
                let mut state = self.state.borrow_mut();
                state.status = SessionStatus::Loading;
                state.epoch
            };
            log::debug!("Loading conversation {}", id);
            (epoch, self.backend.get_chat(&credential, id).await)
        };

        let outcome = if !self.is_epoch(epoch) {
            CommandOutcome::Discarded
        } else {
            match result {
                Err(e) if e.is_auth_rejection() => {
                    self.logout();
                    CommandOutcome::SignedOut
                }
                Ok(transcript) => {
                    log::info!(
                        "Opened conversation {} ({} messages)",
                        transcript.id,
                        transcript.messages.len()
                    );
                    let mut state = self.state.borrow_mut();
                    state.conversation = Conversation::from(transcript);
                    state.status = SessionStatus::Idle;
                    state.notice = None;
                    CommandOutcome::Completed
                }
                Err(e) => {
                    log::warn!("Failed to open conversation {}: {}", id, e);
                    let message = format!("Could not open conversation: {}", e);
                    let mut state = self.state.borrow_mut();
                    state.status = SessionStatus::Idle;
                    state.notice = Some(message.clone());
                    CommandOutcome::Failed(message)
                }
            }
        };

        self.run_deferred_search().await;
        outcome
    }

    /// Send `text` on the active conversation, creating it first if it is
    /// still a draft. The user message is appended before any request goes
    /// out; the reply (or an error marker) is appended when it comes back.
    pub async fn send(&self, text: &str) -> CommandOutcome {
        let text = text.trim();
        if text.is_empty() {
            return CommandOutcome::Ignored(IgnoreReason::EmptyInput);
        }
        let Some(credential) = self.session_credential() else {
            return CommandOutcome::Ignored(IgnoreReason::NotSignedIn);
        };

        let (epoch, delivery) = {
            let Some(_guard) = self.gate.try_acquire(Operation::Send) else {
                return CommandOutcome::Ignored(IgnoreReason::Busy);
            };
            let (epoch, existing) = {
                let mut state = self.state.borrow_mut();
                state.conversation.push(Message::user(text));
                state.status = SessionStatus::Sending;
                state.notice = None;
                (state.epoch, state.conversation.id().cloned())
            };
            (epoch, self.deliver(&credential, existing, text, epoch).await)
        };

        let outcome = self.finish_send(epoch, delivery.result);

        if delivery.created && self.tokens.is_present() {
            self.search.take_rerun();
            self.refresh_history().await;
        } else {
            self.run_deferred_search().await;
        }
        outcome
    }

    async fn deliver(
        &self,
        credential: &Credential,
        existing: Option<ChatId>,
        text: &str,
        epoch: u64,
    ) -> Delivery {
        let (id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let title = provisional_title(text);
                match self.backend.create_chat(credential, &title).await {
                    Ok(id) => {
                        log::info!("Created chat {} titled {:?}", id, title);
                        if self.is_epoch(epoch) {
                            self.state.borrow_mut().conversation.assign_id(id.clone());
                        }
                        (id, true)
                    }
                    Err(e) => {
                        log::warn!("Failed to create chat: {}", e);
                        return Delivery {
                            created: false,
                            result: Err(e),
                        };
                    }
                }
            }
        };
        if !self.is_epoch(epoch) {
            return Delivery {
                created,
                result: Ok(Vec::new()),
            };
        }
        Delivery {
            created,
            result: self.backend.send_message(credential, &id, text).await,
        }
    }

    fn finish_send(&self, epoch: u64, result: BackendResult<Vec<WireMessage>>) -> CommandOutcome {
        if !self.is_epoch(epoch) {
            log::debug!("Dropping send result for an ended session");
            return CommandOutcome::Discarded;
        }

        let result = match result {
            Err(e) if e.is_auth_rejection() => {
                self.logout();
                return CommandOutcome::SignedOut;
            }
            other => other,
        };

        let mut state = self.state.borrow_mut();
        state.status = SessionStatus::Idle;
        match result {
            Ok(transcript) => match transcript.into_iter().last() {
                Some(reply) if reply.role == Role::Assistant => {
                    state.conversation.push(Message::from(reply));
                    CommandOutcome::Completed
                }
                other => {
                    log::warn!(
                        "Send response did not end with an assistant reply (last: {:?})",
                        other.map(|m| m.role)
                    );
                    state.conversation.push(Message::error(MISSING_REPLY_MARKER));
                    CommandOutcome::Failed(MISSING_REPLY_MARKER.to_string())
                }
            },
            Err(e) => {
                log::warn!("Send failed: {}", e);
                state.conversation.push(Message::error(CONNECT_ERROR_MARKER));
                CommandOutcome::Failed(e.to_string())
            }
        }
    }

    // ------------------------------------------------------------------
    // History search
    // ------------------------------------------------------------------

    /// Record new search text; pass the ticket to [`settle_search`](Self::settle_search)
    pub fn set_query(&self, text: &str) -> SearchTicket {
        self.search.set_query(text)
    }

    /// Wait out the debounce for `ticket` and fetch if it is still current
    pub async fn settle_search(&self, ticket: SearchTicket) -> SearchOutcome {
        let outcome = self
            .search
            .settle(ticket, &*self.sleeper, &*self.backend, &self.tokens, &self.gate)
            .await;
        self.after_search(outcome)
    }

    /// Fetch the history list for the current query right away
    pub async fn refresh_history(&self) -> SearchOutcome {
        let outcome = self
            .search
            .refresh(&*self.backend, &self.tokens, &self.gate)
            .await;
        self.after_search(outcome)
    }

    async fn run_deferred_search(&self) {
        if self.search.take_rerun() {
            self.refresh_history().await;
        }
    }

    fn after_search(&self, outcome: SearchOutcome) -> SearchOutcome {
        match &outcome {
            SearchOutcome::AuthRejected => self.logout(),
            SearchOutcome::NotSignedIn => {
                if self.status() != SessionStatus::Unauthenticated {
                    self.logout();
                }
            }
            SearchOutcome::Failed(_) => {
                self.state.borrow_mut().notice = Some(HISTORY_ERROR_NOTICE.to_string());
            }
            SearchOutcome::Applied { .. } => {
                let mut state = self.state.borrow_mut();
                if state.notice.as_deref() == Some(HISTORY_ERROR_NOTICE) {
                    state.notice = None;
                }
            }
            SearchOutcome::Superseded | SearchOutcome::Deferred => {}
        }
        outcome
    }
}
