use async_trait::async_trait;
use chatdesk_session::{BackendError, BackendResult, ChatBackend};
use chatdesk_types::{
    AskRequest, AskResponse, ChatId, ChatSummary, ChatTranscript, CreateChatRequest,
    CreateChatResponse, Credential, LoginRequest, SendMessageRequest, SendMessageResponse,
    TokenResponse, WireMessage,
};
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// `ChatBackend` over the browser's `fetch`
pub struct GlooBackend {
    base_url: String,
}

impl GlooBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport(e: gloo_net::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

fn authorized(builder: RequestBuilder, credential: &Credential) -> RequestBuilder {
    builder.header("Authorization", &credential.authorization())
}

async fn send_json<B: Serialize>(builder: RequestBuilder, body: &B) -> BackendResult<Response> {
    builder
        .json(body)
        .map_err(|e| BackendError::Decode(e.to_string()))?
        .send()
        .await
        .map_err(transport)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    if !response.ok() {
        let body = response.text().await.unwrap_or_default();
        log::debug!("Backend answered {}: {}", response.status(), body);
        return Err(BackendError::from_status(response.status(), body));
    }
    response
        .json()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait(?Send)]
impl ChatBackend for GlooBackend {
    async fn login(&self, email: &str, password: &str) -> BackendResult<Credential> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = send_json(Request::post(&self.url("/login")), &body).await?;
        let tokens: TokenResponse = read_json(response).await?;
        Ok(tokens.into())
    }

    async fn list_chats(
        &self,
        credential: &Credential,
        search: Option<&str>,
    ) -> BackendResult<Vec<ChatSummary>> {
        let mut builder = authorized(Request::get(&self.url("/chats/")), credential);
        if let Some(query) = search {
            builder = builder.query([("search", query)]);
        }
        let response = builder.send().await.map_err(transport)?;
        read_json(response).await
    }

    async fn get_chat(&self, credential: &Credential, id: &ChatId) -> BackendResult<ChatTranscript> {
        let response = authorized(Request::get(&self.url(&format!("/chats/{}", id))), credential)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn create_chat(&self, credential: &Credential, title: &str) -> BackendResult<ChatId> {
        let body = CreateChatRequest {
            title: title.to_string(),
        };
        let response =
            send_json(authorized(Request::post(&self.url("/chats/")), credential), &body).await?;
        let created: CreateChatResponse = read_json(response).await?;
        Ok(created.id)
    }

    async fn send_message(
        &self,
        credential: &Credential,
        id: &ChatId,
        content: &str,
    ) -> BackendResult<Vec<WireMessage>> {
        let builder = authorized(
            Request::post(&self.url(&format!("/chats/{}/message", id))),
            credential,
        );
        let response = send_json(builder, &SendMessageRequest::user(content)).await?;
        let reply: SendMessageResponse = read_json(response).await?;
        Ok(reply.messages)
    }

    async fn ask(&self, message: &str) -> BackendResult<String> {
        let body = AskRequest {
            message: message.to_string(),
        };
        let response = send_json(Request::post(&self.url("/ask")), &body).await?;
        let answer: AskResponse = read_json(response).await?;
        Ok(answer.response)
    }
}
