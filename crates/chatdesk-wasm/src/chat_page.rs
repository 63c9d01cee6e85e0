//! Chat page. Element ids used:
//! `greeting`, `chatTitle`, `messages`, `messageInput`, `sendButton`,
//! `newChatButton`, `logoutButton`, `searchInput`, `chatList`, `notice`.

use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, KeyboardEvent};

use chatdesk_session::view::{greeting_for_hour, short_user_name, COMPOSING_TEXT};
use chatdesk_session::{
    render_session, ChatController, ChatId, ChatView, CommandOutcome, IgnoreReason, Role,
    TokenStore, ViewItem,
};
use chatdesk_types::FALLBACK_USER_NAME;

use crate::dom;
use crate::http::GlooBackend;
use crate::markdown::render_message_content;
use crate::storage::LocalStoragePersistence;
use crate::timer::GlooSleeper;
use crate::utils;

const EMPTY_STATE_TEXT: &str = "What can I help you with?";

pub struct ChatApp {
    document: Document,
    controller: ChatController,
}

impl ChatApp {
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

    pub async fn start(self: Rc<Self>) -> Result<(), JsValue> {
        if !self.controller.tokens().is_present() {
            return crate::redirect(crate::LOGIN_PAGE_PATH);
        }

        self.setup_composer()?;
        self.setup_buttons()?;
        self.setup_search()?;
        self.setup_chat_list()?;

        self.controller.resume().await;
        self.render()
    }

    fn setup_composer(self: &Rc<Self>) -> Result<(), JsValue> {
        let button = dom::get_element_by_id(&self.document, "sendButton")?;
        let app = self.clone();
        dom::add_listener(&button, "click", move |_: web_sys::Event| app.submit())?;

        let input = dom::get_element_by_id(&self.document, "messageInput")?;
        let app = self.clone();
        dom::add_listener(&input, "keydown", move |event: KeyboardEvent| {
            if event.key() == "Enter" && !event.shift_key() {
                event.prevent_default();
                app.submit();
            }
        })
    }

    fn setup_buttons(self: &Rc<Self>) -> Result<(), JsValue> {
        let new_chat = dom::get_element_by_id(&self.document, "newChatButton")?;
        let app = self.clone();
        dom::add_listener(&new_chat, "click", move |_: web_sys::Event| {
            if app.controller.new_chat() {
                app.render_or_log();
            }
        })?;

        let logout = dom::get_element_by_id(&self.document, "logoutButton")?;
        let app = self.clone();
        dom::add_listener(&logout, "click", move |_: web_sys::Event| {
            app.controller.logout();
            app.render_or_log();
        })
    }

    fn setup_search(self: &Rc<Self>) -> Result<(), JsValue> {
        let input = dom::get_element_by_id(&self.document, "searchInput")?;
        let app = self.clone();
        dom::add_listener(&input, "input", move |_: web_sys::Event| {
            let Ok(field) = dom::get_input_by_id(&app.document, "searchInput") else {
                return;
            };
            let ticket = app.controller.set_query(&field.value());
            let app = app.clone();
            wasm_bindgen_futures::spawn_local(async move {
                app.controller.settle_search(ticket).await;
                app.render_or_log();
            });
        })
    }

    /// One listener for the whole list; items carry `data-chat-id`
    fn setup_chat_list(self: &Rc<Self>) -> Result<(), JsValue> {
        let list = dom::get_element_by_id(&self.document, "chatList")?;
        let app = self.clone();
        dom::add_listener(&list, "click", move |event: web_sys::Event| {
            let Some(id) = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .and_then(|element| element.closest(".chat-item").ok().flatten())
                .and_then(|item| item.get_attribute("data-chat-id"))
            else {
                return;
            };

            let app = app.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let id = ChatId::new(id);
                // Render the loading state, then the opened transcript
                futures::join!(app.controller.open_conversation(&id), async {
                    app.render_or_log()
                });
                app.render_or_log();
            });
        })
    }

    fn submit(self: &Rc<Self>) {
        let Ok(input) = dom::get_textarea_by_id(&self.document, "messageInput") else {
            return;
        };
        let text = input.value();
        if text.trim().is_empty() || !self.render_session().input_enabled {
            return;
        }
        input.set_value("");

        let app = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            // The send future appends the user message on its first poll,
            // so the second branch renders it before the reply arrives.
            let (outcome, _) =
                futures::join!(app.controller.send(&text), async { app.render_or_log() });
            if outcome == CommandOutcome::Ignored(IgnoreReason::Busy) {
                // Nothing was appended, so hand the text back to the user
                if let Ok(input) = dom::get_textarea_by_id(&app.document, "messageInput") {
                    if input.value().is_empty() {
                        input.set_value(&text);
                    }
                }
            }
            app.render_or_log();
        });
    }

    fn render_session(&self) -> ChatView {
        render_session(&self.controller.snapshot())
    }

    fn render_or_log(&self) {
        if let Err(e) = self.render() {
            log::error!("Render failed: {:?}", e);
        }
    }

    fn render(&self) -> Result<(), JsValue> {
        let view = self.render_session();
        if !view.signed_in {
            return crate::redirect(crate::LOGIN_PAGE_PATH);
        }

        let name = view.user_name.as_deref().unwrap_or(FALLBACK_USER_NAME);
        dom::get_element_by_id(&self.document, "greeting")?.set_text_content(Some(&format!(
            "{}, {}",
            greeting_for_hour(utils::local_hour()),
            short_user_name(name)
        )));
        dom::get_element_by_id(&self.document, "chatTitle")?.set_text_content(Some(&view.title));

        self.render_messages(&view)?;
        self.render_chat_list(&view)?;

        let notice = dom::get_html_element_by_id(&self.document, "notice")?;
        match &view.notice {
            Some(text) => {
                notice.set_text_content(Some(text));
                dom::show_element(&notice);
            }
            None => dom::hide_element(&notice),
        }

        dom::get_button_by_id(&self.document, "sendButton")?.set_disabled(!view.input_enabled);
        Ok(())
    }

    fn render_messages(&self, view: &ChatView) -> Result<(), JsValue> {
        let container = dom::get_element_by_id(&self.document, "messages")?;
        dom::clear_element(&container);

        if view.empty_state {
            let empty = dom::create_element_with_class(&self.document, "div", "empty-state")?;
            empty.set_text_content(Some(EMPTY_STATE_TEXT));
            container.append_child(&empty)?;
            return Ok(());
        }

        for item in &view.items {
            let element = match item {
                ViewItem::Bubble {
                    role,
                    text,
                    is_error,
                } => {
                    let class = match (role, is_error) {
                        (_, true) => "message assistant error",
                        (Role::User, _) => "message user",
                        _ => "message assistant",
                    };
                    let bubble = dom::create_element_with_class(&self.document, "div", class)?;
                    let markdown = *role == Role::Assistant && !is_error;
                    bubble.set_inner_html(&render_message_content(text, markdown));
                    bubble
                }
                ViewItem::Composing => {
                    let typing =
                        dom::create_element_with_class(&self.document, "div", "message composing")?;
                    typing.set_text_content(Some(COMPOSING_TEXT));
                    typing
                }
            };
            container.append_child(&element)?;
        }

        dom::scroll_to_bottom(&container);
        Ok(())
    }

    fn render_chat_list(&self, view: &ChatView) -> Result<(), JsValue> {
        let list = dom::get_element_by_id(&self.document, "chatList")?;
        dom::clear_element(&list);

        for item in &view.sidebar {
            let class = if item.active {
                "chat-item active"
            } else {
                "chat-item"
            };
            let entry = dom::create_element_with_class(&self.document, "div", class)?;
            entry.set_attribute("data-chat-id", item.id.as_str())?;
            entry.set_text_content(Some(&item.title));
            list.append_child(&entry)?;
        }
        Ok(())
    }
}
