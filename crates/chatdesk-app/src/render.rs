//! Terminal rendering of the session view model

use chatdesk_session::view::{greeting_for_hour, short_user_name, COMPOSING_TEXT};
use chatdesk_logging::safe_truncate;
use chatdesk_session::{ChatView, Message, Role, ViewItem};
use colored::Colorize;

/// Longest conversation title shown in the terminal sidebar, in characters
pub const SIDEBAR_TITLE_WIDTH: usize = 40;

/// "Good Morning, ada" style header line
pub fn format_greeting(view: &ChatView, hour: u32) -> String {
    let name = view
        .user_name
        .as_deref()
        .map(short_user_name)
        .unwrap_or(chatdesk_types::FALLBACK_USER_NAME);
    format!("{}, {}", greeting_for_hour(hour), name)
}

pub fn format_item(item: &ViewItem) -> String {
    match item {
        ViewItem::Bubble {
            is_error: true,
            text,
            ..
        } => format!("{} {}", "!".red().bold(), text.red()),
        ViewItem::Bubble {
            role: Role::User,
            text,
            ..
        } => format!("{} {}", "You:".bright_green().bold(), text),
        ViewItem::Bubble { role, text, .. } => {
            let label = match role {
                Role::Assistant => "Assistant:",
                _ => "System:",
            };
            format!("{} {}", label.bright_cyan().bold(), text)
        }
        ViewItem::Composing => COMPOSING_TEXT.bright_black().italic().to_string(),
    }
}

pub fn format_message(message: &Message) -> String {
    format_item(&ViewItem::from(message))
}

/// One line per saved conversation, the active one marked with `*`
pub fn format_sidebar(view: &ChatView) -> Vec<String> {
    view.sidebar
        .iter()
        .map(|item| {
            let marker = if item.active { "*" } else { " " };
            let title = safe_truncate(&item.title, SIDEBAR_TITLE_WIDTH);
            let line = format!("{} [{}] {}", marker, item.id, title);
            if item.active {
                line.bright_white().bold().to_string()
            } else {
                line
            }
        })
        .collect()
}

pub fn print_header(view: &ChatView, hour: u32) {
    if !view.signed_in {
        println!("{}", "Not signed in. Type /login to sign in.".bright_yellow());
        return;
    }
    println!("{}", format_greeting(view, hour).bright_cyan().bold());
    println!("{}", format!("Conversation: {}", view.title).bright_black());
    if view.empty_state {
        println!("{}", "What can I help you with?".bright_black());
    }
}

pub fn print_sidebar(view: &ChatView) {
    if !view.search_query.is_empty() {
        println!("{}", format!("Chats matching \"{}\":", view.search_query).bright_black());
    }
    let lines = format_sidebar(view);
    if lines.is_empty() {
        println!("{}", "No conversations.".bright_black());
    }
    for line in lines {
        println!("{}", line);
    }
}

pub fn print_notice(view: &ChatView) {
    if let Some(notice) = &view.notice {
        println!("{} {}", "⚠️".yellow(), notice.yellow());
    }
}
