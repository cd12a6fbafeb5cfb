//! Terminal rendering and stdin-backed dialogs.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

use chat_history_core::search::SearchOutcome;
use chat_history_core::{Dialogs, HistoryEvent, HistoryItem, SidebarView};

/// Lines read from stdin by a dedicated thread.
///
/// A plain thread is used so a pending read never keeps the runtime alive
/// after Ctrl+C.
pub struct Lines {
    rx: Mutex<Receiver<String>>,
}

impl Lines {
    pub fn stdin() -> Arc<Self> {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self::from_receiver(rx)
    }

    /// Lines fed by any sender.
    pub fn from_receiver(rx: Receiver<String>) -> Arc<Self> {
        Arc::new(Self { rx: Mutex::new(rx) })
    }

    /// Next line, or `None` once stdin is closed.
    pub fn next_line(&self) -> Option<String> {
        self.rx.lock().ok()?.recv().ok()
    }

    /// Print `label` and wait for the answer.
    pub fn ask(&self, label: &str) -> Option<String> {
        print!("{label}");
        let _ = io::stdout().flush();
        self.next_line()
    }
}

/// `prompt` and `confirm` answered on the terminal.
pub struct TerminalDialogs {
    lines: Arc<Lines>,
}

impl TerminalDialogs {
    pub fn new(lines: Arc<Lines>) -> Self {
        Self { lines }
    }
}

impl Dialogs for TerminalDialogs {
    /// The default is shown as a hint only. A blank line cancels.
    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        let answer = self
            .lines
            .ask(&format!("{message} (actuel: {default}, vide pour annuler) "))?;
        if answer.trim().is_empty() {
            None
        } else {
            Some(answer)
        }
    }

    fn confirm(&self, message: &str) -> bool {
        self.lines
            .ask(&format!("{message} [o/N] "))
            .map(|a| matches!(a.trim().chars().next(), Some('o' | 'O' | 'y' | 'Y')))
            .unwrap_or(false)
    }
}

/// Plain-text sidebar: one header per bucket, numbered entries, `*` on the
/// active one.
pub fn format_view(view: &SidebarView) -> String {
    if view.is_empty() {
        return "(aucune conversation)\n".to_string();
    }

    let mut out = String::new();
    let mut index = 0;
    for section in &view.sections {
        out.push_str(section.label());
        out.push('\n');
        for item in &section.items {
            index += 1;
            let marker = if item.active { '*' } else { ' ' };
            out.push_str(&format!("  {marker} {index:>2}. {}  [{}]\n", item.title, item.id));
        }
    }
    out
}

pub fn format_history(history: &[HistoryItem]) -> String {
    let mut out = String::new();
    for item in history {
        match item {
            HistoryItem::Exchange(ex) => {
                out.push_str(&format!("> {}\n{}\n", ex.message, ex.response));
                if !ex.sources.is_empty() {
                    out.push_str(&format!("  sources: {}\n", ex.sources.join(", ")));
                }
            }
            HistoryItem::Message(msg) if msg.is_user() => {
                out.push_str(&format!("> {}\n", msg.content));
            }
            HistoryItem::Message(msg) => {
                out.push_str(&format!("{}\n", msg.content));
            }
        }
    }
    out
}

pub fn format_search(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Hint => format!("{}\n", chat_history_core::search::SEARCH_HINT),
        SearchOutcome::NoResults => format!("{}\n", chat_history_core::search::NO_RESULTS),
        SearchOutcome::Matches(hits) => hits
            .iter()
            .enumerate()
            .map(|(i, hit)| format!("  {:>2}. {}  {}  [{}]\n", i + 1, hit.title, hit.date, hit.id))
            .collect(),
    }
}

pub fn print_event(event: &HistoryEvent) {
    match event {
        HistoryEvent::Rendered { view } => print!("\n{}", format_view(view)),
        HistoryEvent::ConversationLoaded {
            conversation_id,
            history,
        } => print!("\n== {conversation_id} ==\n{}", format_history(history)),
        HistoryEvent::NewConversation { conversation_id } => {
            println!("Nouvelle conversation: {conversation_id}")
        }
        HistoryEvent::ConversationDeleted => println!("Conversation active supprimée"),
        HistoryEvent::Error { message } => eprintln!("! {message}"),
    }
}
