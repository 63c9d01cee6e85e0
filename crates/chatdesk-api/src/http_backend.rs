use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chatdesk_session::{BackendError, BackendResult, ChatBackend};
use chatdesk_types::{
    AskRequest, AskResponse, ChatId, ChatSummary, ChatTranscript, CreateChatRequest,
    CreateChatResponse, Credential, LoginRequest, SendMessageRequest, SendMessageResponse,
    TokenResponse, WireMessage,
};
use serde::de::DeserializeOwned;

/// Where the chat service listens when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Check that `url` is an http(s) URL and strip trailing slashes so paths can
/// be appended directly.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    let parsed = reqwest::Url::parse(trimmed)
        .with_context(|| format!("Invalid server URL: {}", trimmed))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        bail!("Server URL must use http or https, got {}", parsed.scheme());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// `ChatBackend` speaking JSON over HTTP with reqwest
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

/// Map the status to a `BackendError` or decode the JSON body
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> BackendResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::debug!("Backend answered {}: {}", status, body);
        return Err(BackendError::from_status(status.as_u16(), body));
    }

    let text = response.text().await.map_err(transport)?;
    serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait(?Send)]
impl ChatBackend for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> BackendResult<Credential> {
        log::debug!("POST /login for {}", email);
        let response = self
            .client
            .post(self.url("/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        let tokens: TokenResponse = read_json(response).await?;
        Ok(Credential::from(tokens))
    }

    async fn list_chats(
        &self,
        credential: &Credential,
        search: Option<&str>,
    ) -> BackendResult<Vec<ChatSummary>> {
        let mut request = self
            .client
            .get(self.url("/chats/"))
            .header("Authorization", credential.authorization());
        if let Some(query) = search {
            request = request.query(&[("search", query)]);
        }
        log::debug!("GET /chats/ (search: {:?})", search);

        let response = request.send().await.map_err(transport)?;
        read_json(response).await
    }

    async fn get_chat(&self, credential: &Credential, id: &ChatId) -> BackendResult<ChatTranscript> {
        log::debug!("GET /chats/{}", id);
        let response = self
            .client
            .get(self.url(&format!("/chats/{}", id)))
            .header("Authorization", credential.authorization())
            .send()
            .await
            .map_err(transport)?;

        read_json(response).await
    }

    async fn create_chat(&self, credential: &Credential, title: &str) -> BackendResult<ChatId> {
        log::debug!("POST /chats/ titled {:?}", title);
        let response = self
            .client
            .post(self.url("/chats/"))
            .header("Authorization", credential.authorization())
            .json(&CreateChatRequest {
                title: title.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        let created: CreateChatResponse = read_json(response).await?;
        Ok(created.id)
    }

    async fn send_message(
        &self,
        credential: &Credential,
        id: &ChatId,
        content: &str,
    ) -> BackendResult<Vec<WireMessage>> {
        log::debug!("POST /chats/{}/message ({} chars)", id, content.chars().count());
        let response = self
            .client
            .post(self.url(&format!("/chats/{}/message", id)))
            .header("Authorization", credential.authorization())
            .json(&SendMessageRequest::user(content))
            .send()
            .await
            .map_err(transport)?;

        let reply: SendMessageResponse = read_json(response).await?;
        Ok(reply.messages)
    }

    async fn ask(&self, message: &str) -> BackendResult<String> {
        log::debug!("POST /ask");
        let response = self
            .client
            .post(self.url("/ask"))
            .json(&AskRequest {
                message: message.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        let answer: AskResponse = read_json(response).await?;
        Ok(answer.response)
    }
}
