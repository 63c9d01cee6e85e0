use chatdesk_types::{ChatId, ChatTranscript, Role, WireMessage};

/// Text shown in place of a reply when a request could not complete
pub const CONNECT_ERROR_MARKER: &str = "Error: Could not connect to the server.";

/// Text shown when the backend answered but no assistant reply was found
pub const MISSING_REPLY_MARKER: &str = "Error: The assistant did not return a reply.";

/// One entry of a conversation's message log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Inline failure marker rather than a real reply
    pub is_error: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            is_error: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            is_error: true,
        }
    }
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Self {
            role: wire.role,
            text: wire.content,
            is_error: false,
        }
    }
}

/// The active conversation: a draft until the backend assigns an id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    id: Option<ChatId>,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn draft() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<&ChatId> {
        self.id.as_ref()
    }

    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Only ever appends; earlier messages are never touched.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Give a draft its backend identity
    pub(crate) fn assign_id(&mut self, id: ChatId) {
        debug_assert!(self.id.is_none(), "conversation already persisted");
        self.id = Some(id);
    }
}

impl From<ChatTranscript> for Conversation {
    fn from(transcript: ChatTranscript) -> Self {
        Self {
            id: Some(transcript.id),
            messages: transcript.messages.into_iter().map(Message::from).collect(),
        }
    }
}
