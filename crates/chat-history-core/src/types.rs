//! Conversation data types.
//!
//! # Data Model Overview
//!
//! The backend owns every conversation. The sidebar only keeps a cached copy
//! of the list returned by `GET /api/conversations`:
//!
//! ```text
//! Conversation
//! ├── id              # string or number on the wire, always a String here
//! ├── title?          # blank titles fall back to the first user message
//! ├── updated_at      # drives the recency buckets
//! └── messages?       # usually only the latest exchange
//! ```
//!
//! # Design Principles
//!
//! - **Lenient decoding**: one malformed timestamp must not reject the list
//! - **Pass-through**: fields the sidebar does not use are kept, not dropped

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Sender value used by the backend for user-authored messages.
pub const USER_SENDER: &str = "user";

// ============================================================================
// Conversation Types
// ============================================================================

/// A conversation as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// User-visible title, if one was set.
    #[serde(default)]
    pub title: Option<String>,

    /// When this conversation was last updated.
    ///
    /// `None` when the backend sent nothing usable.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,

    /// When this conversation was created.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    /// Short preview of the last response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// Total number of stored exchanges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,

    /// Messages included with the listing (may be partial).
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create a conversation with only an id and a timestamp.
    pub fn new(id: impl Into<String>, updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            title: None,
            updated_at,
            created_at: None,
            snippet: None,
            message_count: None,
            messages: Vec::new(),
        }
    }

    /// First message written by the user, if any.
    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_user())
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// "user" for the person typing, anything else for the assistant.
    pub sender: String,

    /// Message text.
    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl Message {
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            timestamp: None,
            sources: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(USER_SENDER, content)
    }

    pub fn is_user(&self) -> bool {
        self.sender == USER_SENDER
    }
}

// ============================================================================
// History Types
// ============================================================================

/// A question/answer pair appended to a conversation.
///
/// This is both the body of `POST /api/conversations/{id}/history` and one
/// of the shapes returned by the matching `GET`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub message: String,
    pub response: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Exchange {
    pub fn new(message: impl Into<String>, response: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            message: message.into(),
            response: response.into(),
            sources,
            created_at: None,
        }
    }
}

/// One entry of a conversation's history.
///
/// Backends return either stored exchanges or flat messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryItem {
    Exchange(Exchange),
    Message(Message),
}

/// Response body of `GET /api/conversations/{id}/history`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryItem>,
}

// ============================================================================
// Request / Response Bodies
// ============================================================================

/// Body of `POST /api/conversations` and `PATCH /api/conversations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

/// Response of `POST /api/conversations`.
///
/// Older backends answer with `conversation_id`, newer ones with `id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedConversation {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
}

impl CreatedConversation {
    /// The id of the new conversation, preferring `conversation_id`.
    pub fn resolved_id(self) -> Option<String> {
        self.conversation_id
            .filter(|id| !id.is_empty())
            .or(self.id.filter(|id| !id.is_empty()))
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 and the naive forms SQLite produces. Naive values are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ============================================================================
// TESTS
// ============================================================================
