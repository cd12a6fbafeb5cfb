//! `chat-history` - terminal front end for the conversation history sidebar.

mod terminal;
mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chat_history_core::dialogs::FixedDialogs;
use chat_history_core::paths::default_config_path;
use chat_history_core::render::{render_search_html, render_sidebar_html};
use chat_history_core::{Dialogs, HistoryConfig, HistoryManager, HttpApi};
use clap::{Parser, Subcommand};

use terminal::{format_history, format_search, format_view, Lines, TerminalDialogs};

#[derive(Parser)]
#[command(name = "chat-history", about = "Browse and manage chat conversations")]
struct Cli {
    /// Conversation API origin (overrides config and CHAT_HISTORY_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seconds between automatic refreshes in watch mode
    #[arg(long, global = true)]
    refresh_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List conversations grouped by recency
    List {
        /// Print the sidebar markup instead of text
        #[arg(long)]
        html: bool,
    },
    /// Print a conversation's history
    Show { id: String },
    /// Create a new conversation
    New,
    /// Rename a conversation
    Rename {
        id: String,
        /// New title; prompts when omitted
        #[arg(long)]
        title: Option<String>,
    },
    /// Delete a conversation
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Search conversation titles
    Search {
        query: String,
        #[arg(long)]
        html: bool,
    },
    /// Save a question and its answer
    Save {
        #[arg(long)]
        message: String,
        #[arg(long)]
        response: String,
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Conversation to append to; a new one is created when omitted
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Interactive sidebar with periodic refresh
    Watch,
}

fn load_config(cli: &Cli) -> anyhow::Result<HistoryConfig> {
    let mut config = match cli.config.clone().or_else(default_config_path) {
        Some(path) => HistoryConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HistoryConfig::default(),
    };
    config.apply_env_overrides()?;

    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(secs) = cli.refresh_secs {
        config.refresh_interval_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

fn build_manager(config: &HistoryConfig, dialogs: Box<dyn Dialogs>) -> HistoryManager<HttpApi> {
    HistoryManager::new(HttpApi::from_config(config), dialogs, config)
}

/// The user-facing message of the most recent failure.
fn last_error(manager: &HistoryManager<HttpApi>) -> String {
    manager
        .active_notifications()
        .pop()
        .map(|n| n.message)
        .unwrap_or_else(|| "request failed".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    log::debug!("Using conversation API at {}", config.base_url);

    let lines = Lines::stdin();
    let interactive: Box<dyn Dialogs> = Box::new(TerminalDialogs::new(Arc::clone(&lines)));

    match cli.command {
        Command::Watch => {
            let manager = Arc::new(build_manager(&config, interactive));
            return watch::run(manager, lines).await;
        }
        command => {
            // One-shot commands block on HTTP; keep them off the async workers.
            tokio::task::spawn_blocking(move || run_once(command, &config, interactive)).await?
        }
    }
}

fn run_once(
    command: Command,
    config: &HistoryConfig,
    interactive: Box<dyn Dialogs>,
) -> anyhow::Result<()> {
    match command {
        Command::List { html } => {
            let manager = build_manager(config, interactive);
            if !manager.load_conversations() {
                bail!(last_error(&manager));
            }
            if html {
                println!("{}", render_sidebar_html(&manager.view()));
            } else {
                print!("{}", format_view(&manager.view()));
            }
        }
        Command::Show { id } => {
            let manager = build_manager(config, interactive);
            let Some(history) = manager.load_conversation(&id) else {
                bail!(last_error(&manager));
            };
            print!("{}", format_history(&history));
        }
        Command::New => {
            let manager = build_manager(config, interactive);
            let Some(id) = manager.create_new_chat() else {
                bail!(last_error(&manager));
            };
            println!("{id}");
        }
        Command::Rename { id, title } => {
            let dialogs: Box<dyn Dialogs> = match title {
                Some(title) => Box::new(FixedDialogs::accepting(Some(title))),
                None => interactive,
            };
            let manager = build_manager(config, dialogs);
            // The prompt shows the current title as a hint.
            manager.load_conversations();
            if !manager.rename_conversation(&id) && !manager.active_notifications().is_empty() {
                bail!(last_error(&manager));
            }
        }
        Command::Delete { id, yes } => {
            let dialogs: Box<dyn Dialogs> = if yes {
                Box::new(FixedDialogs::accepting(None))
            } else {
                interactive
            };
            let manager = build_manager(config, dialogs);
            if !manager.delete_conversation(&id) && !manager.active_notifications().is_empty() {
                bail!(last_error(&manager));
            }
        }
        Command::Search { query, html } => {
            let manager = build_manager(config, interactive);
            if !manager.load_conversations() {
                bail!(last_error(&manager));
            }
            let mut dialog = manager.show_search_dialog();
            let outcome = dialog.input(&query).clone();
            if html {
                println!("{}", render_search_html(&outcome));
            } else {
                print!("{}", format_search(&outcome));
            }
        }
        Command::Save {
            message,
            response,
            sources,
            conversation,
        } => {
            let manager = build_manager(config, interactive);
            manager.set_current_conversation_id(conversation);
            if !manager.save_message(&message, &response, sources) {
                bail!(last_error(&manager));
            }
            if let Some(id) = manager.current_conversation_id() {
                println!("{id}");
            }
        }
        Command::Watch => bail!("watch is interactive and cannot run as a one-shot command"),
    }
    Ok(())
}
