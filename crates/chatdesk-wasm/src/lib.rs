use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

mod chat_page;
mod dom;
mod http;
mod login_page;
mod markdown;
mod storage;
mod timer;
mod utils;

pub use http::GlooBackend;
pub use storage::LocalStoragePersistence;
pub use timer::GlooSleeper;

/// Path of the sign-in page
pub const LOGIN_PAGE_PATH: &str = "/";
/// Path of the chat page
pub const CHAT_PAGE_PATH: &str = "/dashboard";

/// Initialize the WASM application
/// This sets up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    wasm_logger::init(wasm_logger::Config::default());

    log::info!("chatdesk WASM initialized");
}

/// Initialize the sign-in page
#[wasm_bindgen]
pub async fn init_login_page() -> Result<(), JsValue> {
    log::info!("Initializing login page");
    login_page::LoginApp::new()?.start()
}

/// Initialize the chat page
#[wasm_bindgen]
pub async fn init_chat_page() -> Result<(), JsValue> {
    log::info!("Initializing chat page");
    chat_page::ChatApp::new()?.start().await
}

/// Get the window object
fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))
}

/// Get the document object
fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object"))
}

/// Navigate to another page of the app
fn redirect(path: &str) -> Result<(), JsValue> {
    window()?.location().set_href(path)
}
