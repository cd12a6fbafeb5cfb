//! HistoryManager - owns the cached conversation list and every action on it.
//!
//! # Failure policy
//!
//! Backend failures never escape the manager. Each one is logged, shown as a
//! short-lived notification and published as [`HistoryEvent::Error`]. State
//! is only mutated after a successful response, and nothing is retried.
//!
//! # Concurrency
//!
//! The manager is shared behind an `Arc`. The state mutex is never held
//! across a backend call, so a refresh can run while a user action is in
//! flight. Overlapping list fetches are not ordered: whichever response
//! arrives last replaces the cache.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use chrono::Local;

use crate::api::{ApiError, ConversationApi};
use crate::config::HistoryConfig;
use crate::dialogs::{Dialogs, DELETE_CONFIRM, RENAME_PROMPT};
use crate::event_bus::{EventBus, HistoryEvent};
use crate::keys::KeyPress;
use crate::notify::{Notification, Notifier};
use crate::render::{render_search_html, render_sidebar_html, SidebarAction, SidebarView};
use crate::search::{search_conversations, SearchOutcome};
use crate::title::{generate_title, DEFAULT_TITLE};
use crate::types::{Conversation, Exchange, HistoryItem};

/// Mutable state of the sidebar.
#[derive(Debug, Default)]
struct ManagerState {
    /// The conversation shown in the chat view, if any.
    current_conversation_id: Option<String>,

    /// Result of the most recent successful list fetch.
    conversations: Vec<Conversation>,
}

/// Background thread re-fetching the list at a fixed interval.
///
/// The thread is detached. It exits at its next wake-up once the stop
/// signal is sent or the timer is dropped, so stopping never waits for a
/// fetch in flight.
struct RefreshTimer {
    stop_tx: mpsc::Sender<()>,
}

impl RefreshTimer {
    fn start<A>(manager: Weak<HistoryManager<A>>, interval: Duration) -> Option<Self>
    where
        A: ConversationApi + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("history-refresh".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let Some(manager) = manager.upgrade() else {
                            break;
                        };
                        log::debug!("Periodic history refresh");
                        manager.load_conversations();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        match spawned {
            Ok(_) => Some(Self { stop_tx }),
            Err(e) => {
                log::error!("Failed to start history refresh thread: {}", e);
                None
            }
        }
    }

    fn stop(self) {
        let _ = self.stop_tx.send(());
    }
}

/// The conversation history sidebar.
pub struct HistoryManager<A: ConversationApi> {
    api: A,
    dialogs: Box<dyn Dialogs>,
    events: Arc<EventBus>,
    notifier: Notifier,
    refresh_interval: Duration,
    state: Mutex<ManagerState>,
    refresh: Mutex<Option<RefreshTimer>>,
}

impl<A: ConversationApi> HistoryManager<A> {
    pub fn new(api: A, dialogs: impl Dialogs + 'static, config: &HistoryConfig) -> Self {
        Self {
            api,
            dialogs: Box::new(dialogs),
            events: Arc::new(EventBus::new()),
            notifier: Notifier::new(config.notification_ttl()),
            refresh_interval: config.refresh_interval(),
            state: Mutex::new(ManagerState::default()),
            refresh: Mutex::new(None),
        }
    }

    /// Publish on an existing bus instead of a private one.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_conversation_id(&self) -> Option<String> {
        self.lock_state().current_conversation_id.clone()
    }

    /// Point the sidebar at a conversation opened elsewhere.
    pub fn set_current_conversation_id(&self, id: Option<String>) {
        self.lock_state().current_conversation_id = id;
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.lock_state().conversations.clone()
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Log an error and show it as a short-lived notification.
    pub fn show_error(&self, message: &str) {
        log::error!("{}", message);
        self.notifier.push(message);
        self.events.emit(HistoryEvent::Error {
            message: message.to_string(),
        });
    }

    pub fn active_notifications(&self) -> Vec<Notification> {
        self.notifier.active()
    }

    fn report(&self, context: &str, user_message: &str, err: &ApiError) {
        log::warn!("{}: {}", context, err);
        self.show_error(user_message);
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// The sidebar as it should currently look.
    pub fn view(&self) -> SidebarView {
        let state = self.lock_state();
        SidebarView::build(
            &state.conversations,
            state.current_conversation_id.as_deref(),
            &Local::now(),
        )
    }

    /// Rebuild the view and publish it to subscribers.
    pub fn display_conversations(&self) -> SidebarView {
        let view = self.view();
        self.events.emit(HistoryEvent::Rendered { view: view.clone() });
        view
    }

    pub fn render_html(&self) -> String {
        render_sidebar_html(&self.view())
    }

    // ========================================================================
    // Backend operations
    // ========================================================================

    /// Fetch the list and replace the cache.
    ///
    /// On failure the previous list and current id are kept.
    pub fn load_conversations(&self) -> bool {
        match self.api.list_conversations() {
            Ok(conversations) => {
                log::debug!("Loaded {} conversations", conversations.len());
                self.lock_state().conversations = conversations;
                self.display_conversations();
                true
            }
            Err(e) => {
                self.report(
                    "Failed to load conversations",
                    "Impossible de charger l'historique",
                    &e,
                );
                false
            }
        }
    }

    /// Open a conversation: fetch its history and make it current.
    pub fn load_conversation(&self, id: &str) -> Option<Vec<HistoryItem>> {
        match self.api.load_history(id) {
            Ok(history) => {
                self.lock_state().current_conversation_id = Some(id.to_string());
                self.display_conversations();
                self.events.emit(HistoryEvent::ConversationLoaded {
                    conversation_id: id.to_string(),
                    history: history.clone(),
                });
                Some(history)
            }
            Err(e) => {
                self.report(
                    &format!("Failed to load conversation {id}"),
                    "Impossible de charger cette conversation",
                    &e,
                );
                None
            }
        }
    }

    /// Create a conversation and make it current.
    pub fn create_new_chat(&self) -> Option<String> {
        match self.api.create_conversation(DEFAULT_TITLE) {
            Ok(id) => {
                log::info!("Created conversation {}", id);
                self.lock_state().current_conversation_id = Some(id.clone());
                self.load_conversations();
                self.events.emit(HistoryEvent::NewConversation {
                    conversation_id: id.clone(),
                });
                Some(id)
            }
            Err(e) => {
                self.report(
                    "Failed to create conversation",
                    "Impossible de créer une nouvelle conversation",
                    &e,
                );
                None
            }
        }
    }

    /// Ask for a new title and apply it.
    ///
    /// Returns `false` when the user cancels, answers blank, or the call fails.
    pub fn rename_conversation(&self, id: &str) -> bool {
        let current_title = self
            .lock_state()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .map(generate_title)
            .unwrap_or_default();

        let Some(answer) = self.dialogs.prompt(RENAME_PROMPT, &current_title) else {
            return false;
        };
        let title = answer.trim();
        if title.is_empty() {
            return false;
        }

        match self.api.rename_conversation(id, title) {
            Ok(()) => {
                self.load_conversations();
                true
            }
            Err(e) => {
                self.report(
                    &format!("Failed to rename conversation {id}"),
                    "Impossible de renommer cette conversation",
                    &e,
                );
                false
            }
        }
    }

    /// Confirm, then delete a conversation.
    ///
    /// Deleting the current conversation clears it and emits
    /// [`HistoryEvent::ConversationDeleted`].
    pub fn delete_conversation(&self, id: &str) -> bool {
        if !self.dialogs.confirm(DELETE_CONFIRM) {
            return false;
        }

        if let Err(e) = self.api.delete_conversation(id) {
            self.report(
                &format!("Failed to delete conversation {id}"),
                "Impossible de supprimer cette conversation",
                &e,
            );
            return false;
        }

        let was_current = {
            let mut state = self.lock_state();
            let was_current = state.current_conversation_id.as_deref() == Some(id);
            if was_current {
                state.current_conversation_id = None;
            }
            was_current
        };
        if was_current {
            self.events.emit(HistoryEvent::ConversationDeleted);
        }

        self.load_conversations();
        true
    }

    /// Persist a question/answer pair in the current conversation.
    ///
    /// A conversation is created first when none is current. If that fails,
    /// nothing is posted.
    pub fn save_message(&self, message: &str, response: &str, sources: Vec<String>) -> bool {
        let id = match self.current_conversation_id() {
            Some(id) => id,
            None => match self.create_new_chat() {
                Some(id) => id,
                None => return false,
            },
        };

        let exchange = Exchange::new(message, response, sources);
        match self.api.append_history(&id, &exchange) {
            Ok(()) => {
                self.load_conversations();
                true
            }
            Err(e) => {
                self.report(
                    &format!("Failed to save message in {id}"),
                    "Impossible de sauvegarder le message",
                    &e,
                );
                false
            }
        }
    }

    // ========================================================================
    // Search and input
    // ========================================================================

    /// Filter the cached list by title.
    pub fn search(&self, query: &str) -> SearchOutcome {
        search_conversations(&self.lock_state().conversations, query)
    }

    pub fn show_search_dialog(&self) -> SearchDialog<'_, A> {
        SearchDialog::new(self)
    }

    /// Ctrl/Cmd+K opens the search dialog.
    pub fn handle_key(&self, key: &KeyPress) -> Option<SearchDialog<'_, A>> {
        key.is_search_shortcut().then(|| self.show_search_dialog())
    }

    /// Run a sidebar action. Only [`SidebarAction::OpenSearch`] yields a dialog.
    pub fn dispatch(&self, action: SidebarAction) -> Option<SearchDialog<'_, A>> {
        match action {
            SidebarAction::NewChat => {
                self.create_new_chat();
            }
            SidebarAction::OpenSearch => return Some(self.show_search_dialog()),
            SidebarAction::Select(id) => {
                self.load_conversation(&id);
            }
            SidebarAction::Rename(id) => {
                self.rename_conversation(&id);
            }
            SidebarAction::Delete(id) => {
                self.delete_conversation(&id);
            }
        }
        None
    }
}

impl<A: ConversationApi + 'static> HistoryManager<A> {
    /// Load the list, then start the periodic refresh.
    pub fn initialize_history(self: &Arc<Self>) {
        self.load_conversations();
        self.setup_history_refresh();
    }

    /// Start (or restart) the periodic refresh.
    pub fn setup_history_refresh(self: &Arc<Self>) {
        let timer = RefreshTimer::start(Arc::downgrade(self), self.refresh_interval);
        let previous = {
            let mut slot = self.refresh.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, timer)
        };
        if let Some(previous) = previous {
            previous.stop();
        }
    }
}

impl<A: ConversationApi> HistoryManager<A> {
    /// Stop the periodic refresh, if running.
    pub fn stop_history_refresh(&self) {
        let timer = self
            .refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            timer.stop();
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

// ============================================================================
// Search dialog
// ============================================================================

/// A live search over the manager's cached list.
///
/// Every [`input`](SearchDialog::input) re-runs the filter against the list
/// as it is at that moment, so refreshes are picked up while typing.
pub struct SearchDialog<'a, A: ConversationApi> {
    manager: &'a HistoryManager<A>,
    query: String,
    outcome: Option<SearchOutcome>,
    open: bool,
}

impl<'a, A: ConversationApi> SearchDialog<'a, A> {
    fn new(manager: &'a HistoryManager<A>) -> Self {
        Self {
            manager,
            query: String::new(),
            outcome: None,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Results for the last input; `None` before the user types.
    pub fn outcome(&self) -> Option<&SearchOutcome> {
        self.outcome.as_ref()
    }

    /// Replace the query and re-filter.
    pub fn input(&mut self, query: &str) -> &SearchOutcome {
        self.query = query.to_string();
        self.outcome.insert(self.manager.search(query))
    }

    /// Markup for the results area (empty before the first input).
    pub fn render_html(&self) -> String {
        self.outcome
            .as_ref()
            .map(render_search_html)
            .unwrap_or_default()
    }

    /// Open the chosen conversation and close the dialog.
    pub fn select(&mut self, id: &str) -> Option<Vec<HistoryItem>> {
        let history = self.manager.load_conversation(id);
        self.close();
        history
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}

// ============================================================================
// TESTS
// ============================================================================
