//! # chat-history-core
//!
//! Conversation history sidebar for a chat application.
//!
//! This crate is framework-agnostic and can be used by:
//! - the `chat-history` terminal front end
//! - any UI that can render a [`SidebarView`] and report [`SidebarAction`]s
//!
//! ## Key Concepts
//!
//! - **Conversation**: a titled, timestamped sequence of chat messages
//! - **Bucket**: one of five fixed recency groups (today, yesterday, ...)
//! - **HistoryManager**: owns the cached list and talks to the REST backend
//! - **HistoryEvent**: what the manager announces to the rest of the app

pub mod api;
pub mod config;
pub mod dialogs;
pub mod event_bus;
pub mod grouping;
pub mod keys;
pub mod logging;
pub mod manager;
pub mod notify;
pub mod paths;
pub mod render;
pub mod search;
pub mod title;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use api::{ApiError, ConversationApi, HttpApi};
pub use config::HistoryConfig;
pub use dialogs::Dialogs;
pub use event_bus::{EventBus, HistoryEvent};
pub use grouping::{group_by_date, Bucket};
pub use manager::{HistoryManager, SearchDialog};
pub use render::{escape_html, SidebarAction, SidebarView};
pub use search::SearchOutcome;
pub use title::generate_title;
pub use types::{Conversation, Exchange, HistoryItem, Message};
