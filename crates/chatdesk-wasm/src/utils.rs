use wasm_bindgen::JsValue;

/// Escape HTML to prevent XSS
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Base URL of the chat API: `data-api-base` on `<body>`, else the page origin
pub fn api_base() -> Result<String, JsValue> {
    let document = crate::document()?;
    if let Some(base) = document
        .body()
        .and_then(|body| body.get_attribute("data-api-base"))
        .filter(|base| !base.trim().is_empty())
    {
        return Ok(base.trim().trim_end_matches('/').to_string());
    }

    crate::window()?
        .location()
        .origin()
        .map_err(|_| JsValue::from_str("Failed to get page origin"))
}

/// Current local hour (0-23) from the browser clock
pub fn local_hour() -> u32 {
    js_sys::Date::new_0().get_hours()
}
