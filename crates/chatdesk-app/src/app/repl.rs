use anyhow::Result;
use chrono::Timelike;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use chatdesk_logging::{get_logs_dir, TranscriptLogger};
use chatdesk_session::{ChatId, CommandOutcome, IgnoreReason, QuickAsk, Role, SearchOutcome};

use crate::app::commands::prompt_credentials;
use crate::app::Session;
use crate::config::AppConfig;
use crate::render;

const HELP: &str = "\
Commands:
  /login [email]   sign in
  /logout          sign out and forget the saved session
  /new             start a new conversation
  /open <id>       open a saved conversation
  /search <text>   filter saved conversations (empty text clears the filter)
  /chats           list saved conversations
  /ask <text>      single question outside any conversation
  /help            show this help
  /quit            exit
Anything else is sent as a message.";

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Login(Option<String>),
    Logout,
    New,
    Open(String),
    Search(String),
    Chats,
    Ask(String),
    Help,
    Quit,
    Send(String),
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if matches!(line, "exit" | "quit") {
            return Some(ReplCommand::Quit);
        }
        let Some(command) = line.strip_prefix('/') else {
            return Some(ReplCommand::Send(line.to_string()));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        let arg = || (!rest.is_empty()).then(|| rest.to_string());

        Some(match name {
            "login" => ReplCommand::Login(arg()),
            "logout" => ReplCommand::Logout,
            "new" => ReplCommand::New,
            "open" => match arg() {
                Some(id) => ReplCommand::Open(id),
                None => ReplCommand::Unknown(line.to_string()),
            },
            "search" => ReplCommand::Search(rest.to_string()),
            "chats" => ReplCommand::Chats,
            "ask" => ReplCommand::Ask(rest.to_string()),
            "help" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// REPL state on top of a [`Session`]: what has already been printed and
/// logged, plus the single-turn asker.
pub struct Repl {
    session: Session,
    asker: QuickAsk,
    logger: Option<TranscriptLogger>,
    shown: usize,
    logged: usize,
}

impl Repl {
    pub fn new(session: Session, logger: Option<TranscriptLogger>) -> Self {
        let asker = session.quick_ask();
        Self {
            session,
            asker,
            logger,
            shown: 0,
            logged: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn print_header(&self) {
        render::print_header(&self.session.view(), chrono::Local::now().hour());
    }

    pub async fn login(&mut self, email: &str, password: &str) {
        match self.session.controller().login(email, password).await {
            Ok(()) => {
                self.reset_cursors();
                self.print_header();
                render::print_notice(&self.session.view());
            }
            Err(e) => println!("{}", e.to_string().red()),
        }
    }

    /// Run one command. Login is handled by the caller, which owns the prompt.
    pub async fn execute(&mut self, command: ReplCommand) -> Flow {
        let controller = self.session.controller();
        match command {
            ReplCommand::Quit => return Flow::Quit,
            ReplCommand::Help => println!("{}", HELP.bright_black()),
            ReplCommand::Unknown(line) => {
                println!("{}", format!("Unknown command: {} (try /help)", line).yellow())
            }
            ReplCommand::Login(_) => {}
            ReplCommand::Logout => {
                controller.logout();
                self.reset_cursors();
                println!("{}", "Signed out.".green());
            }
            ReplCommand::New => {
                if controller.new_chat() {
                    self.reset_cursors();
                    self.print_header();
                }
            }
            ReplCommand::Open(id) => {
                let outcome = controller.open_conversation(&ChatId::new(id)).await;
                if outcome == CommandOutcome::Completed {
                    self.reset_cursors();
                    // Opened history is shown but not logged again
                    self.logged = self.session.controller().conversation().len();
                    self.print_header();
                }
                self.show_new_messages(true).await;
                self.report(outcome);
            }
            ReplCommand::Search(text) => {
                let ticket = controller.set_query(&text);
                let outcome = controller.settle_search(ticket).await;
                if outcome == SearchOutcome::NotSignedIn {
                    self.report(CommandOutcome::Ignored(IgnoreReason::NotSignedIn));
                } else if outcome == SearchOutcome::AuthRejected {
                    self.report(CommandOutcome::SignedOut);
                } else {
                    render::print_sidebar(&self.session.view());
                }
                render::print_notice(&self.session.view());
            }
            ReplCommand::Chats => {
                controller.refresh_history().await;
                let view = self.session.view();
                if view.signed_in {
                    render::print_sidebar(&view);
                    render::print_notice(&view);
                } else {
                    self.report(CommandOutcome::Ignored(IgnoreReason::NotSignedIn));
                }
            }
            ReplCommand::Ask(text) => {
                let already = self.asker.messages().len();
                let outcome = self.asker.ask(&text).await;
                for message in self.asker.messages().iter().skip(already + 1) {
                    println!("{}", render::format_message(message));
                }
                if let CommandOutcome::Ignored(IgnoreReason::EmptyInput) = outcome {
                    println!("{}", "Usage: /ask <text>".yellow());
                }
            }
            ReplCommand::Send(text) => {
                let outcome = controller.send(&text).await;
                self.show_new_messages(false).await;
                self.report(outcome);
            }
        }
        Flow::Continue
    }

    fn reset_cursors(&mut self) {
        self.shown = 0;
        self.logged = 0;
    }

    /// Print (and log) messages appended since the last call. Lines the user
    /// just typed are already on screen unless `include_user` is set.
    async fn show_new_messages(&mut self, include_user: bool) {
        let conversation = self.session.controller().conversation();
        let messages = conversation.messages();
        if messages.len() < self.shown {
            self.reset_cursors();
        }

        for message in messages.iter().skip(self.shown) {
            if !include_user && message.role == Role::User {
                continue;
            }
            println!("{}", render::format_message(message));
        }
        self.shown = messages.len();

        if let Some(logger) = &mut self.logger {
            self.logged = logger
                .log_since(conversation.id(), messages, self.logged)
                .await;
        }
    }

    fn report(&self, outcome: CommandOutcome) {
        match outcome {
            CommandOutcome::Completed | CommandOutcome::Failed(_) => {
                render::print_notice(&self.session.view())
            }
            CommandOutcome::Ignored(IgnoreReason::NotSignedIn) => {
                println!("{}", "Not signed in. Type /login to sign in.".yellow())
            }
            CommandOutcome::Ignored(IgnoreReason::Busy) => {
                println!("{}", "Still waiting for the previous request.".yellow())
            }
            CommandOutcome::Ignored(IgnoreReason::EmptyInput) => {}
            CommandOutcome::SignedOut => println!(
                "{}",
                "Your session has expired. Type /login to sign in again.".yellow()
            ),
            CommandOutcome::Discarded => log::debug!("Response arrived after sign-out"),
        }
    }
}

/// Run interactive REPL mode
pub async fn run_repl_mode(config: &AppConfig) -> Result<()> {
    println!("{}", "💬 chatdesk".bright_cyan().bold());
    println!("{}", format!("Server: {}", config.server_url).bright_black());
    println!("{}", "Type /help for commands, /quit to exit\n".bright_black());

    let session = Session::open(config)?;

    let logger = if config.transcript_log {
        match get_logs_dir(&config.data_dir) {
            Ok(dir) => match TranscriptLogger::new(&dir).await {
                Ok(logger) => {
                    println!(
                        "{}",
                        format!("📝 Transcript: {}", logger.file_path().display()).bright_black()
                    );
                    Some(logger)
                }
                Err(e) => {
                    eprintln!("Logging disabled: {:#}", e);
                    None
                }
            },
            Err(e) => {
                eprintln!("Logging disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let mut repl = Repl::new(session, logger);
    repl.session().controller().resume().await;
    repl.print_header();
    render::print_notice(&repl.session().view());

    let mut rl = DefaultEditor::new()?;
    loop {
        let readline = rl.readline(&format!("{} ", "You:".bright_green().bold()));
        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let Some(command) = ReplCommand::parse(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.trim());

        if let ReplCommand::Login(email) = &command {
            let (email, password) = prompt_credentials(&mut rl, email.clone())?;
            repl.login(&email, &password).await;
            continue;
        }

        if repl.execute(command).await == Flow::Quit {
            break;
        }
    }

    println!("{}", "Goodbye!".bright_cyan());
    Ok(())
}
