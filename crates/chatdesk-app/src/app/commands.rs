use anyhow::{bail, Result};
use colored::Colorize;
use rustyline::DefaultEditor;

use chatdesk_session::{CommandOutcome, SessionStatus};

use crate::app::Session;
use crate::cli::Commands;
use crate::config::AppConfig;
use crate::render;

/// Ask for whatever part of the login the caller did not supply.
/// `CHATDESK_PASSWORD` skips the password prompt.
pub fn prompt_credentials(
    editor: &mut DefaultEditor,
    email: Option<String>,
) -> Result<(String, String)> {
    let email = match email {
        Some(email) => email,
        None => editor.readline("Email: ")?,
    };
    let password = match std::env::var("CHATDESK_PASSWORD") {
        Ok(password) => password,
        Err(_) => editor.readline("Password: ")?,
    };
    Ok((email, password))
}

/// Execute a one-shot subcommand
pub async fn run_command(command: &Commands, config: &AppConfig) -> Result<()> {
    let session = Session::open(config)?;
    let controller = session.controller();

    match command {
        Commands::Login { email } => {
            let mut editor = DefaultEditor::new()?;
            let (email, password) = prompt_credentials(&mut editor, email.clone())?;
            controller.login(&email, &password).await?;
            let view = session.view();
            println!(
                "{}",
                format!(
                    "Signed in as {}",
                    view.user_name.as_deref().unwrap_or(chatdesk_types::FALLBACK_USER_NAME)
                )
                .green()
            );
        }
        Commands::Logout => {
            controller.logout();
            println!("{}", "Signed out.".green());
        }
        Commands::Chats { search } => {
            if !controller.resume().await {
                bail!("Not signed in. Run `chatdesk login` first.");
            }
            if let Some(query) = search {
                let ticket = controller.set_query(query);
                controller.settle_search(ticket).await;
            }
            if controller.status() == SessionStatus::Unauthenticated {
                bail!("Session expired. Run `chatdesk login` again.");
            }
            let view = session.view();
            render::print_sidebar(&view);
            render::print_notice(&view);
        }
        Commands::Ask { text } => {
            let asker = session.quick_ask();
            let outcome = asker.ask(&text.join(" ")).await;
            for message in asker.messages().iter().skip(1) {
                println!("{}", render::format_message(message));
            }
            if let CommandOutcome::Failed(reason) = outcome {
                bail!("Ask failed: {}", reason);
            }
        }
    }

    Ok(())
}
