//! Access to the conversation REST backend.
//!
//! The backend is an external collaborator. The manager only talks to it
//! through [`ConversationApi`], which keeps the manager testable without a
//! server and lets front ends plug in another transport.
//!
//! # Endpoints
//!
//! ```text
//! GET    /api/conversations               -> [Conversation]
//! POST   /api/conversations               {title} -> {id | conversation_id}
//! PATCH  /api/conversations/{id}          {title}
//! DELETE /api/conversations/{id}
//! GET    /api/conversations/{id}/history  -> {history: [...]}
//! POST   /api/conversations/{id}/history  {message, response, sources}
//! ```

mod http;

pub use http::HttpApi;

use thiserror::Error;

use crate::types::{Conversation, Exchange, HistoryItem};

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("HTTP error! status: {status} ({url})")]
    Status { status: u16, url: String },

    /// The request never got a response (DNS, connection refused, timeout).
    #[error("Network error: {0}")]
    Transport(String),

    /// The response body was not what the endpoint should return.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// `POST /api/conversations` returned neither `id` nor `conversation_id`.
    #[error("Created conversation has no id")]
    MissingId,
}

/// Operations of the conversation backend.
///
/// Implementations block the calling thread until the response arrives.
pub trait ConversationApi: Send + Sync {
    /// `GET /api/conversations`
    fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// `POST /api/conversations`, returning the new id.
    fn create_conversation(&self, title: &str) -> Result<String, ApiError>;

    /// `PATCH /api/conversations/{id}`
    fn rename_conversation(&self, id: &str, title: &str) -> Result<(), ApiError>;

    /// `DELETE /api/conversations/{id}`
    fn delete_conversation(&self, id: &str) -> Result<(), ApiError>;

    /// `GET /api/conversations/{id}/history`
    fn load_history(&self, id: &str) -> Result<Vec<HistoryItem>, ApiError>;

    /// `POST /api/conversations/{id}/history`
    fn append_history(&self, id: &str, exchange: &Exchange) -> Result<(), ApiError>;
}
