//! In-memory conversation backend for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use crate::api::{ApiError, ConversationApi};
use crate::types::{Conversation, Exchange, HistoryItem, Message};

/// Behaves like the real backend, records every call, and can be switched
/// into a failing mode where each request answers 500.
#[derive(Default)]
pub struct MockApi {
    conversations: Mutex<Vec<Conversation>>,
    histories: Mutex<HashMap<String, Vec<HistoryItem>>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    failing: AtomicBool,
    list_delay: Mutex<Duration>,
}

impl MockApi {
    pub fn with(conversations: Vec<Conversation>) -> Self {
        let api = Self::default();
        api.replace(conversations);
        api
    }

    pub fn replace(&self, conversations: Vec<Conversation>) {
        *self.conversations.lock().unwrap() = conversations;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every list fetch take at least `delay`.
    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &str, path: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(format!("{method} {path}"));
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                url: path,
            });
        }
        Ok(())
    }

    fn not_found(path: String) -> ApiError {
        ApiError::Status {
            status: 404,
            url: path,
        }
    }
}

impl ConversationApi for MockApi {
    fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.record("GET", "/api/conversations".into())?;
        let delay = *self.list_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(self.conversations.lock().unwrap().clone())
    }

    fn create_conversation(&self, title: &str) -> Result<String, ApiError> {
        self.record("POST", "/api/conversations".into())?;
        let id = format!("conv-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut conv = Conversation::new(id.clone(), Some(Utc::now()));
        conv.title = Some(title.to_string());
        self.conversations.lock().unwrap().insert(0, conv);
        Ok(id)
    }

    fn rename_conversation(&self, id: &str, title: &str) -> Result<(), ApiError> {
        let path = format!("/api/conversations/{id}");
        self.record("PATCH", path.clone())?;
        let mut convs = self.conversations.lock().unwrap();
        let conv = convs
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Self::not_found(path))?;
        conv.title = Some(title.to_string());
        conv.updated_at = Some(Utc::now());
        Ok(())
    }

    fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        self.record("DELETE", format!("/api/conversations/{id}"))?;
        self.conversations.lock().unwrap().retain(|c| c.id != id);
        self.histories.lock().unwrap().remove(id);
        Ok(())
    }

    fn load_history(&self, id: &str) -> Result<Vec<HistoryItem>, ApiError> {
        let path = format!("/api/conversations/{id}/history");
        self.record("GET", path.clone())?;
        if !self.conversations.lock().unwrap().iter().any(|c| c.id == id) {
            return Err(Self::not_found(path));
        }
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    fn append_history(&self, id: &str, exchange: &Exchange) -> Result<(), ApiError> {
        self.record("POST", format!("/api/conversations/{id}/history"))?;
        self.histories
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push(HistoryItem::Exchange(exchange.clone()));

        let mut convs = self.conversations.lock().unwrap();
        if let Some(conv) = convs.iter_mut().find(|c| c.id == id) {
            conv.messages = vec![
                Message::user(exchange.message.clone()),
                Message::new("ai", exchange.response.clone()),
            ];
            conv.updated_at = Some(Utc::now());
        }
        Ok(())
    }
}
