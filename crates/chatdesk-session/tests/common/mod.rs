#![allow(dead_code)]

use async_trait::async_trait;
use chatdesk_session::{
    BackendError, BackendResult, ChatBackend, ChatController, Sleeper, TokenStore,
};
use chatdesk_types::{ChatId, ChatSummary, ChatTranscript, Credential, WireMessage};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Backend call as seen by the scripted backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login { email: String },
    ListChats { token: String, search: Option<String> },
    GetChat { id: String },
    CreateChat { title: String },
    SendMessage { id: String, content: String },
    Ask { message: String },
}

type Scripted<T> = RefCell<VecDeque<(BackendResult<T>, Option<Duration>)>>;

/// In-memory backend that replays queued responses and records every call.
///
/// When a queue is empty a sensible default is returned: an empty history,
/// chat id `1`, and an echoing assistant.
#[derive(Default)]
pub struct ScriptedBackend {
    calls: RefCell<Vec<Call>>,
    latency: Cell<Duration>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
    logins: Scripted<Credential>,
    lists: Scripted<Vec<ChatSummary>>,
    chats: Scripted<ChatTranscript>,
    creates: Scripted<ChatId>,
    sends: Scripted<Vec<WireMessage>>,
    asks: Scripted<String>,
}

impl ScriptedBackend {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn set_latency(&self, latency: Duration) {
        self.latency.set(latency);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Search filters of every history fetch, in order
    pub fn list_searches(&self) -> Vec<Option<String>> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::ListChats { search, .. } => Some(search.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }

    pub fn push_login(&self, result: BackendResult<Credential>) {
        self.logins.borrow_mut().push_back((result, None));
    }

    pub fn push_list(&self, result: BackendResult<Vec<ChatSummary>>, delay: Option<Duration>) {
        self.lists.borrow_mut().push_back((result, delay));
    }

    pub fn push_chat(&self, result: BackendResult<ChatTranscript>) {
        self.chats.borrow_mut().push_back((result, None));
    }

    pub fn push_create(&self, result: BackendResult<ChatId>) {
        self.creates.borrow_mut().push_back((result, None));
    }

    pub fn push_send(&self, result: BackendResult<Vec<WireMessage>>) {
        self.sends.borrow_mut().push_back((result, None));
    }

    pub fn push_ask(&self, result: BackendResult<String>) {
        self.asks.borrow_mut().push_back((result, None));
    }

    async fn respond<T>(
        &self,
        call: Call,
        queue: &Scripted<T>,
        default: impl FnOnce() -> BackendResult<T>,
    ) -> BackendResult<T> {
        self.calls.borrow_mut().push(call);
        let now = self.in_flight.get() + 1;
        self.in_flight.set(now);
        self.max_in_flight.set(self.max_in_flight.get().max(now));

        let scripted = queue.borrow_mut().pop_front();
        let (result, delay) = match scripted {
            Some((result, delay)) => (result, delay),
            None => (default(), None),
        };
        let delay = delay.unwrap_or_else(|| self.latency.get());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.set(self.in_flight.get() - 1);
        result
    }
}

#[async_trait(?Send)]
impl ChatBackend for ScriptedBackend {
    async fn login(&self, email: &str, _password: &str) -> BackendResult<Credential> {
        self.respond(
            Call::Login {
                email: email.to_string(),
            },
            &self.logins,
            || Ok(Credential::bearer("session-token")),
        )
        .await
    }

    async fn list_chats(
        &self,
        credential: &Credential,
        search: Option<&str>,
    ) -> BackendResult<Vec<ChatSummary>> {
        self.respond(
            Call::ListChats {
                token: credential.access_token.clone(),
                search: search.map(|s| s.to_string()),
            },
            &self.lists,
            || Ok(Vec::new()),
        )
        .await
    }

    async fn get_chat(&self, _credential: &Credential, id: &ChatId) -> BackendResult<ChatTranscript> {
        self.respond(
            Call::GetChat {
                id: id.to_string(),
            },
            &self.chats,
            || Err(BackendError::from_status(404, "not found")),
        )
        .await
    }

    async fn create_chat(&self, _credential: &Credential, title: &str) -> BackendResult<ChatId> {
        self.respond(
            Call::CreateChat {
                title: title.to_string(),
            },
            &self.creates,
            || Ok(ChatId::new("1")),
        )
        .await
    }

    async fn send_message(
        &self,
        _credential: &Credential,
        id: &ChatId,
        content: &str,
    ) -> BackendResult<Vec<WireMessage>> {
        let echo = format!("Echo: {}", content);
        let asked = content.to_string();
        self.respond(
            Call::SendMessage {
                id: id.to_string(),
                content: content.to_string(),
            },
            &self.sends,
            move || Ok(vec![WireMessage::user(asked), WireMessage::assistant(echo)]),
        )
        .await
    }

    async fn ask(&self, message: &str) -> BackendResult<String> {
        self.respond(
            Call::Ask {
                message: message.to_string(),
            },
            &self.asks,
            || Ok("Answer".to_string()),
        )
        .await
    }
}

/// Debounce clock backed by tokio's (pausable) timer
pub struct TokioSleeper;

#[async_trait(?Send)]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub fn summary(id: &str, title: &str) -> ChatSummary {
    ChatSummary {
        id: ChatId::new(id),
        title: title.to_string(),
    }
}

pub fn controller_with(backend: &Rc<ScriptedBackend>) -> (Rc<TokenStore>, ChatController) {
    let tokens = Rc::new(TokenStore::in_memory());
    let controller = ChatController::new(backend.clone(), tokens.clone(), Rc::new(TokioSleeper));
    (tokens, controller)
}

/// Controller that is already signed in, with the call log cleared
pub async fn signed_in(backend: &Rc<ScriptedBackend>) -> (Rc<TokenStore>, ChatController) {
    let (tokens, controller) = controller_with(backend);
    tokens.set(Credential::bearer("session-token"));
    assert!(controller.resume().await);
    backend.clear_calls();
    (tokens, controller)
}
