//! Interactive mode: the sidebar stays on screen, refreshes on its own, and
//! reads one command per line.

use std::sync::Arc;

use chat_history_core::keys::KeyPress;
use chat_history_core::search::SearchOutcome;
use chat_history_core::{ConversationApi, HistoryManager, SearchDialog, SidebarAction};
use tokio::sync::{broadcast, oneshot};

use crate::terminal::{format_search, print_event, Lines};

const HELP: &str = "\
Commandes:
  n, new             nouvelle conversation
  o, open <n|id>     ouvrir une conversation
  r, rename <n|id>   renommer
  d, delete <n|id>   supprimer
  s, search, Ctrl+K  rechercher
  l, list            recharger la liste
  h, help            cette aide
  q, quit            quitter
";

/// A parsed input line.
#[derive(Debug, PartialEq)]
enum Command {
    Action(SidebarAction),
    Key(KeyPress),
    Search,
    Reload,
    Help,
    Quit,
    Unknown(String),
}

/// Parse one input line. A raw Ctrl+K (`\x0b`) anywhere opens search.
fn parse_line(line: &str, resolve: impl Fn(&str) -> String) -> Option<Command> {
    if line.contains('\u{b}') {
        return Some(Command::Key(KeyPress::new("k").with_ctrl()));
    }

    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    let arg = parts.next().map(&resolve);

    let command = match (verb, arg) {
        ("n" | "new", _) => Command::Action(SidebarAction::NewChat),
        ("o" | "open", Some(id)) => Command::Action(SidebarAction::Select(id)),
        ("r" | "rename", Some(id)) => Command::Action(SidebarAction::Rename(id)),
        ("d" | "delete", Some(id)) => Command::Action(SidebarAction::Delete(id)),
        ("s" | "search" | "/", _) => Command::Search,
        ("l" | "list", _) => Command::Reload,
        ("h" | "help" | "?", _) => Command::Help,
        ("q" | "quit" | "exit", _) => Command::Quit,
        _ => Command::Unknown(line.trim().to_string()),
    };
    Some(command)
}

/// Map a 1-based position in the displayed sidebar to a conversation id.
fn resolve_target<A: ConversationApi>(manager: &HistoryManager<A>, arg: &str) -> String {
    arg.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| manager.view().items().nth(i).map(|item| item.id.clone()))
        .unwrap_or_else(|| arg.to_string())
}

/// Run the search dialog until the user selects a hit or enters a blank line.
fn run_search<A: ConversationApi>(mut dialog: SearchDialog<'_, A>, lines: &Lines) {
    while dialog.is_open() {
        let Some(line) = lines.ask("Rechercher (vide pour fermer, #n pour ouvrir): ") else {
            dialog.close();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            dialog.close();
            continue;
        }

        if let Some(n) = line.strip_prefix('#').and_then(|n| n.parse::<usize>().ok()) {
            let target = match dialog.outcome() {
                Some(SearchOutcome::Matches(hits)) => n
                    .checked_sub(1)
                    .and_then(|i| hits.get(i))
                    .map(|hit| hit.id.clone()),
                _ => None,
            };
            match target {
                Some(id) => {
                    dialog.select(&id);
                }
                None => println!("Aucun résultat #{n}"),
            }
            continue;
        }

        print!("{}", format_search(dialog.input(line)));
    }
}

/// Blocking command loop. Returns when the user quits or stdin closes.
fn command_loop<A: ConversationApi>(manager: &HistoryManager<A>, lines: &Lines) {
    print!("{HELP}");
    while let Some(line) = lines.next_line() {
        let Some(command) = parse_line(&line, |arg| resolve_target(manager, arg)) else {
            continue;
        };

        match command {
            Command::Action(action) => {
                if let Some(dialog) = manager.dispatch(action) {
                    run_search(dialog, lines);
                }
            }
            Command::Key(key) => {
                if let Some(dialog) = manager.handle_key(&key) {
                    run_search(dialog, lines);
                }
            }
            Command::Search => run_search(manager.show_search_dialog(), lines),
            Command::Reload => {
                manager.load_conversations();
            }
            Command::Help => print!("{HELP}"),
            Command::Quit => break,
            Command::Unknown(text) => println!("Commande inconnue: {text} (h pour l'aide)"),
        }
    }
}

/// Start the refresh timer, print every event, and serve commands until
/// quit, end of input, or Ctrl+C.
pub async fn run<A>(manager: Arc<HistoryManager<A>>, lines: Arc<Lines>) -> anyhow::Result<()>
where
    A: ConversationApi + 'static,
{
    let mut rx = manager.events().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => print_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("Event printer skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let init = Arc::clone(&manager);
    tokio::task::spawn_blocking(move || init.initialize_history()).await?;

    let (done_tx, done_rx) = oneshot::channel::<()>();
    let worker = Arc::clone(&manager);
    std::thread::Builder::new()
        .name("history-commands".to_string())
        .spawn(move || {
            command_loop(&worker, &lines);
            let _ = done_tx.send(());
        })?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => log::info!("Interrupted"),
        _ = done_rx => {}
    }

    manager.stop_history_refresh();
    printer.abort();
    Ok(())
}
