//! Framework-agnostic event broadcasting.
//!
//! The EventBus replaces the page-level custom events a browser sidebar would
//! dispatch. Every consumer (chat view, terminal printer, tests) subscribes
//! and receives the same [`HistoryEvent`]s.
//!
//! # Example
//!
//! ```rust
//! use chat_history_core::event_bus::{EventBus, HistoryEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.emit(HistoryEvent::NewConversation { conversation_id: "abc".into() });
//!
//! let event = rx.try_recv().unwrap();
//! assert_eq!(event.event_type(), "conversation:new");
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::render::SidebarView;
use crate::types::HistoryItem;

/// Default channel capacity for the event bus.
/// Events beyond this capacity will cause slow subscribers to miss events (lag).
const DEFAULT_CAPACITY: usize = 256;

/// Everything the history manager announces to the rest of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEvent {
    /// A conversation's history was fetched and it became the current one.
    ConversationLoaded {
        conversation_id: String,
        history: Vec<HistoryItem>,
    },

    /// A conversation was created and became the current one.
    NewConversation { conversation_id: String },

    /// The current conversation was deleted.
    ConversationDeleted,

    /// The sidebar was re-rendered.
    Rendered { view: SidebarView },

    /// A short-lived error notification was shown.
    Error { message: String },
}

impl HistoryEvent {
    /// Stable event type identifier (e.g. "conversation:loaded").
    pub fn event_type(&self) -> &'static str {
        match self {
            HistoryEvent::ConversationLoaded { .. } => "conversation:loaded",
            HistoryEvent::NewConversation { .. } => "conversation:new",
            HistoryEvent::ConversationDeleted => "conversation:deleted",
            HistoryEvent::Rendered { .. } => "history:rendered",
            HistoryEvent::Error { .. } => "history:error",
        }
    }
}

/// A broadcast bus for [`HistoryEvent`]s.
///
/// Uses a tokio broadcast channel internally, so receivers can be polled from
/// async tasks (`recv().await`) or plain threads (`blocking_recv()`).
pub struct EventBus {
    sender: broadcast::Sender<HistoryEvent>,
}

impl EventBus {
    /// Create a new EventBus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new EventBus with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// If there are no subscribers, the event is dropped and 0 is returned.
    pub fn emit(&self, event: HistoryEvent) -> usize {
        log::trace!("emit {}", event.event_type());
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all future events on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.sender.subscribe()
    }

    /// Get the current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
