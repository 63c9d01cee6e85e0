//! Sign-in page. Expects `#loginForm` with `#email`, `#password`,
//! `#loginButton` and an error line `#loginError`.

use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::Document;

use chatdesk_session::{ChatController, TokenStore};

use crate::dom;
use crate::http::GlooBackend;
use crate::storage::LocalStoragePersistence;
use crate::timer::GlooSleeper;
use crate::utils;

pub struct LoginApp {
    document: Document,
    controller: ChatController,
}

impl LoginApp {
    pub fn new() -> Result<Rc<Self>, JsValue> {
        let document = crate::document()?;
        let backend = Rc::new(GlooBackend::new(utils::api_base()?));
        let tokens = Rc::new(TokenStore::restore(Box::new(LocalStoragePersistence)));
        let controller = ChatController::new(backend, tokens, Rc::new(GlooSleeper));

        Ok(Rc::new(Self {
            document,
            controller,
        }))
    }

    pub fn start(self: Rc<Self>) -> Result<(), JsValue> {
        if self.controller.tokens().is_present() {
            return crate::redirect(crate::CHAT_PAGE_PATH);
        }

        let form = dom::get_element_by_id(&self.document, "loginForm")?;
        let app = self.clone();
        dom::add_listener(&form, "submit", move |event: web_sys::Event| {
            event.prevent_default();
            let app = app.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = app.submit().await {
                    log::error!("Login failed: {:?}", e);
                }
            });
        })
    }

    async fn submit(&self) -> Result<(), JsValue> {
        let email = dom::get_input_by_id(&self.document, "email")?.value();
        let password = dom::get_input_by_id(&self.document, "password")?.value();
        let button = dom::get_button_by_id(&self.document, "loginButton")?;
        let error_line = dom::get_html_element_by_id(&self.document, "loginError")?;

        dom::hide_element(&error_line);
        button.set_disabled(true);
        let result = self.controller.login(&email, &password).await;
        button.set_disabled(false);

        match result {
            Ok(()) => crate::redirect(crate::CHAT_PAGE_PATH),
            Err(e) => {
                error_line.set_text_content(Some(&e.to_string()));
                dom::show_element(&error_line);
                Ok(())
            }
        }
    }
}
