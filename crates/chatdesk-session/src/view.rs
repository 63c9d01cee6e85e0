//! Pure derivation of renderable state from a [`SessionSnapshot`].
//!
//! Front ends call [`render_session`] after every controller transition and
//! draw the result; nothing here feeds back into the controller.

use chatdesk_types::{ChatId, Role};

use crate::controller::{SessionSnapshot, SessionStatus};
use crate::conversation::Message;

pub const NEW_CHAT_TITLE: &str = "New chat";
pub const UNTITLED_CHAT_TITLE: &str = "Untitled chat";
pub const COMPOSING_TEXT: &str = "Assistant is typing...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewItem {
    Bubble {
        role: Role,
        text: String,
        is_error: bool,
    },
    /// Trailing placeholder while a reply is outstanding
    Composing,
}

impl From<&Message> for ViewItem {
    fn from(message: &Message) -> Self {
        ViewItem::Bubble {
            role: message.role,
            text: message.text.clone(),
            is_error: message.is_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    pub id: ChatId,
    pub title: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub signed_in: bool,
    pub user_name: Option<String>,
    pub title: String,
    pub items: Vec<ViewItem>,
    /// Draft with nothing in it yet
    pub empty_state: bool,
    pub sidebar: Vec<SidebarItem>,
    pub search_query: String,
    pub notice: Option<String>,
    /// A send would be admitted right now
    pub input_enabled: bool,
}

pub fn render_session(snapshot: &SessionSnapshot) -> ChatView {
    let active_id = snapshot.conversation.id();

    let mut items: Vec<ViewItem> = snapshot
        .conversation
        .messages()
        .iter()
        .map(ViewItem::from)
        .collect();
    if snapshot.status == SessionStatus::Sending {
        items.push(ViewItem::Composing);
    }

    let sidebar: Vec<SidebarItem> = snapshot
        .history
        .iter()
        .map(|summary| SidebarItem {
            id: summary.id.clone(),
            title: display_title(&summary.title),
            active: active_id == Some(&summary.id),
        })
        .collect();

    let title = match active_id {
        None => NEW_CHAT_TITLE.to_string(),
        Some(id) => sidebar
            .iter()
            .find(|item| &item.id == id)
            .map(|item| item.title.clone())
            .unwrap_or_else(|| format!("Chat {}", id)),
    };

    ChatView {
        signed_in: snapshot.status != SessionStatus::Unauthenticated,
        user_name: snapshot.user.clone(),
        title,
        empty_state: snapshot.conversation.is_draft() && snapshot.conversation.is_empty(),
        items,
        sidebar,
        search_query: snapshot.query.clone(),
        notice: snapshot.notice.clone(),
        input_enabled: snapshot.status == SessionStatus::Idle && snapshot.in_flight.is_none(),
    }
}

fn display_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        UNTITLED_CHAT_TITLE.to_string()
    } else {
        title.to_string()
    }
}

/// Greeting for the local hour of day (0-23)
pub fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good Morning",
        12..=16 => "Good Afternoon",
        _ => "Good Evening",
    }
}

/// Part of the user name before any `@`
pub fn short_user_name(name: &str) -> &str {
    name.split('@').next().unwrap_or(name)
}
