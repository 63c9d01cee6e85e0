use anyhow::Result;
use chatdesk_api::HttpBackend;
use chatdesk_session::{
    render_session, ChatBackend, ChatController, ChatView, QuickAsk, TokenStore,
};
use std::rc::Rc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::credential_file::FileCredentialStore;
use crate::sleeper::TokioSleeper;

/// Everything one run of the client talks through
pub struct Session {
    backend: Rc<dyn ChatBackend>,
    controller: ChatController,
}

impl Session {
    /// HTTP backend plus the credential saved under the data directory
    pub fn open(config: &AppConfig) -> Result<Self> {
        let backend = Rc::new(HttpBackend::new(&config.server_url)?);
        let tokens = Rc::new(TokenStore::restore(Box::new(FileCredentialStore::new(
            config.credential_path(),
        ))));
        Ok(Self::with_backend(backend, tokens, config.search_debounce))
    }

    pub fn with_backend(
        backend: Rc<dyn ChatBackend>,
        tokens: Rc<TokenStore>,
        debounce: Duration,
    ) -> Self {
        let controller = ChatController::new(backend.clone(), tokens, Rc::new(TokioSleeper))
            .with_debounce(debounce);
        Self {
            backend,
            controller,
        }
    }

    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    /// Single-turn asker sharing this session's backend
    pub fn quick_ask(&self) -> QuickAsk {
        QuickAsk::new(self.backend.clone())
    }

    pub fn view(&self) -> ChatView {
        render_session(&self.controller.snapshot())
    }
}
