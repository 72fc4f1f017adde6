use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use relay_core::{
    Chat, ChatApp, ChatManager, ChatStorage, IdentityStore, MessageSender, RelayConfig,
    SendOutcome, WebhookClient,
};

const WELCOME: &str = "Hello! I'm Relay, your webhook assistant. How can I help you today?";

/// Relay - a small webhook-backed chat client with local history.
#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Chat with a webhook endpoint from your terminal", long_about = None)]
struct Cli {
    /// Path to the config file (defaults to <config-dir>/relay/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/new".to_string(),
                "/chats".to_string(),
                "/switch".to_string(),
                "/settings".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RelayConfig::load(path),
        None => RelayConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    let url = config.webhook_url()?;
    let storage_dir = config.storage_dir();

    let storage = ChatStorage::new(&storage_dir)
        .with_context(|| format!("Failed to open storage at {}", storage_dir.display()))?;
    let identity = IdentityStore::new(&storage_dir)
        .with_context(|| format!("Failed to open storage at {}", storage_dir.display()))?;
    let manager = ChatManager::open(storage, identity).context("Failed to restore chats")?;

    let mut app = ChatApp::new(manager, Arc::new(WebhookClient::new(url)));

    run_repl(&mut app).await
}

async fn run_repl(app: &mut ChatApp) -> Result<()> {
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== Relay ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a message to send it, '/new' for a fresh chat, '/chats' for history, or 'quit' to exit."
            .bright_black()
    );
    println!();

    render_chat(app.manager_mut().current_chat());

    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if let Some(command) = trimmed.strip_prefix('/') {
                    handle_command(app, command)?;
                } else {
                    send(app, trimmed).await?;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}

async fn send(app: &mut ChatApp, text: &str) -> Result<()> {
    println!("{}", format!("> {text}").green());
    println!("{}", "...".bright_black());

    match app.send_message(text).await? {
        SendOutcome::Delivered { reply } => {
            for line in reply.lines() {
                println!("{}", line.bright_blue());
            }
        }
        SendOutcome::Failed { error } => {
            println!("{}", error.red());
        }
        SendOutcome::Busy => {
            println!(
                "{}",
                "A request is already in flight; wait for it to finish.".bright_black()
            );
        }
        SendOutcome::EmptyInput => {}
    }

    Ok(())
}

fn handle_command(app: &mut ChatApp, command: &str) -> Result<()> {
    let mut parts = command.split_whitespace();

    match parts.next() {
        Some("new") => {
            let chat = app.manager_mut().start_new_chat()?;
            println!("{}", format!("Started '{}'", chat.title).bright_black());
            println!("{}", WELCOME.bright_blue());
        }
        Some("chats") => {
            list_chats(app);
        }
        Some("switch") => match parts.next().and_then(|raw| raw.parse::<usize>().ok()) {
            Some(index) => switch_chat(app, index),
            None => println!(
                "{}",
                "Usage: /switch <number> (see /chats)".bright_black()
            ),
        },
        Some("settings") => {
            // Placeholder, matching the unimplemented settings surface.
            println!("{}", "Settings - coming soon".bright_black());
        }
        _ => {
            println!("{}", "Unknown command".bright_black());
        }
    }

    Ok(())
}

fn list_chats(app: &mut ChatApp) {
    let current_id = app.manager_mut().current_chat().id.clone();
    let chats = app.manager().chats();

    if chats.is_empty() {
        println!("{}", "No chats yet.".bright_black());
        return;
    }

    // Most recent chats first, as the sidebar showed them.
    for (index, chat) in chats.iter().rev().enumerate() {
        let marker = if chat.id == current_id { "*" } else { " " };
        println!(
            "{}",
            format!(
                "{marker} {:>2}. {} ({} messages)",
                index + 1,
                chat.title,
                chat.messages.len()
            )
            .bright_black()
        );
    }
}

fn switch_chat(app: &mut ChatApp, index: usize) {
    let chats = app.manager().chats();
    let Some(chat) = index
        .checked_sub(1)
        .and_then(|offset| chats.iter().rev().nth(offset))
    else {
        println!("{}", "No such chat (see /chats)".bright_black());
        return;
    };

    let id = chat.id.clone();
    app.manager_mut().select_chat(id);

    let chat = app.manager_mut().current_chat().clone();
    println!("{}", format!("--- {} ---", chat.title).bright_magenta());
    render_chat(&chat);
}

fn render_chat(chat: &Chat) {
    if chat.messages.is_empty() {
        println!("{}", WELCOME.bright_blue());
        return;
    }

    for message in &chat.messages {
        match message.sender {
            MessageSender::User => println!("{}", format!("> {}", message.text).green()),
            MessageSender::Assistant => {
                for line in message.text.lines() {
                    println!("{}", line.bright_blue());
                }
            }
        }
    }
}
