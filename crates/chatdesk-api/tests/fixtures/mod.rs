#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-access-token";

/// Mock chat service for exercising the HTTP backend
pub struct ChatMockServer {
    server: MockServer,
}

impl ChatMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Mock a successful login for the given account
    pub async fn mock_login_success(&self, email: &str, password: &str) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({ "email": email, "password": password })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TEST_TOKEN,
                "refresh_token": "test-refresh-token",
                "token_type": "bearer"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_login_rejected(&self) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Incorrect email or password"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the history listing, requiring the test bearer token
    pub async fn mock_list_chats(&self, chats: Value) {
        Mock::given(method("GET"))
            .and(path("/chats/"))
            .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(chats))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_get_chat(&self, id: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/chats/{}", id)))
            .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_chat(&self, title: &str, id: Value) {
        Mock::given(method("POST"))
            .and(path("/chats/"))
            .and(body_json(json!({ "title": title })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_send_message(&self, id: &str, content: &str, reply: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/chats/{}/message", id)))
            .and(body_json(json!({ "role": "user", "content": content })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    { "role": "user", "content": content },
                    { "role": "assistant", "content": reply }
                ]
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_ask(&self, message: &str, answer: &str) {
        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(body_json(json!({ "message": message })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": answer })))
            .mount(&self.server)
            .await;
    }

    /// Mock any request with a bare status code and body
    pub async fn mock_status(&self, http_method: &str, route: &str, status: u16, body: &str) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }
}
