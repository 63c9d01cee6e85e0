//! Core types for chatdesk
//!
//! This crate provides the wire types of the chat backend's HTTP contract and
//! the session credential shared by every other chatdesk crate.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Number of characters of the first message used as a new chat's title
pub const TITLE_PREFIX_CHARS: usize = 30;

/// Display name used when the access token carries no readable subject
pub const FALLBACK_USER_NAME: &str = "User";

// ============================================================================
// Identifiers
// ============================================================================

/// Backend conversation identifier.
///
/// The backend may hand out numeric or string ids; both are kept as text so
/// they can be echoed back in request paths unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChatId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for ChatId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(ChatId(s)),
            serde_json::Value::Number(n) => Ok(ChatId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "chat id must be a string or number, got {}",
                other
            ))),
        }
    }
}

// ============================================================================
// Credential
// ============================================================================

/// Bearer credential issued by `POST /login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Credential {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token: None,
        }
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Who the token was issued to, read from the JWT payload.
    ///
    /// Prefers `sub`, then `email`. Tokens that are not JWTs, or whose payload
    /// cannot be decoded, yield `None`.
    pub fn subject(&self) -> Option<String> {
        let payload = self.access_token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
        ["sub", "email"]
            .iter()
            .filter_map(|key| claims.get(*key).and_then(|v| v.as_str()))
            .find(|s| !s.is_empty())
            .map(|s| s.to_string())
    }

    /// Subject for display, falling back to a generic name
    pub fn display_name(&self) -> String {
        self.subject()
            .unwrap_or_else(|| FALLBACK_USER_NAME.to_string())
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Anything else the backend may send (e.g. `system`)
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other => "other",
        }
    }
}

/// Helper function to deserialize string or null values
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Message as exchanged with the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub content: String,
}

impl WireMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /chats/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub title: String,
}

/// Body of `POST /chats/{id}/message`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub role: Role,
    pub content: String,
}

impl SendMessageRequest {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub message: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Response of `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

impl From<TokenResponse> for Credential {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            refresh_token: response.refresh_token,
        }
    }
}

/// Entry of `GET /chats/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: ChatId,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub title: String,
}

/// Response of `GET /chats/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTranscript {
    pub id: ChatId,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

/// Response of `POST /chats/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatResponse {
    pub id: ChatId,
}

/// Response of `POST /chats/{id}/message`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

/// Response of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub response: String,
}

/// Title given to a chat created from its first message: the first
/// [`TITLE_PREFIX_CHARS`] characters of the trimmed text.
pub fn provisional_title(text: &str) -> String {
    text.trim().chars().take(TITLE_PREFIX_CHARS).collect()
}
