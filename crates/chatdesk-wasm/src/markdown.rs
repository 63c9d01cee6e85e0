use pulldown_cmark::{html, Options, Parser};

/// Render markdown to HTML
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    // Raw HTML from the assistant is shown as text, not injected
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        pulldown_cmark::Event::Html(raw) | pulldown_cmark::Event::InlineHtml(raw) => {
            pulldown_cmark::Event::Text(raw)
        }
        other => other,
    });
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output.replace("<pre><code", "<pre><code class=\"hljs\"")
}

/// Assistant replies are markdown; everything else is shown as typed
pub fn render_message_content(content: &str, use_markdown: bool) -> String {
    if use_markdown {
        render_markdown(content)
    } else {
        crate::utils::escape_html(content).replace('\n', "<br>")
    }
}
