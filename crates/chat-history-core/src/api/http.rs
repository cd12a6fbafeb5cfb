//! [`ConversationApi`] over HTTP with a blocking `ureq` agent.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ApiError, ConversationApi};
use crate::config::HistoryConfig;
use crate::logging::{self, log_line, LogHandle};
use crate::types::{
    Conversation, CreatedConversation, Exchange, HistoryItem, HistoryResponse, TitleRequest,
};

/// REST client for the conversation backend.
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
    wire_log: LogHandle,
}

impl HttpApi {
    /// Client for `base_url` with default timeouts and no wire log.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from_config(&HistoryConfig {
            base_url: base_url.into(),
            ..HistoryConfig::default()
        })
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout())
            .build();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            wire_log: logging::open_log_file(config.wire_log_dir.as_deref(), "http"),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and map transport or status failures to [`ApiError`].
    fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ureq::Response, ApiError> {
        let url = self.url(path);
        log::debug!("{} {}", method, url);

        let request = self
            .agent
            .request(method, &url)
            .set("Accept", "application/json");
        let result = match body {
            Some(json) => request.send_json(json),
            None => request.call(),
        };

        match result {
            Ok(response) => {
                log_line(&self.wire_log, method, &format!("{} -> {}", path, response.status()));
                Ok(response)
            }
            Err(ureq::Error::Status(status, _)) => {
                log_line(&self.wire_log, method, &format!("{} -> {}", path, status));
                Err(ApiError::Status { status, url })
            }
            Err(ureq::Error::Transport(e)) => {
                log_line(&self.wire_log, method, &format!("{} -> {}", path, e));
                Err(ApiError::Transport(e.to_string()))
            }
        }
    }

    fn send_json<B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: &B,
    ) -> Result<ureq::Response, ApiError> {
        let json = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send(method, path, Some(json))
    }

    fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ApiError> {
        response
            .into_json::<T>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl ConversationApi for HttpApi {
    fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        Self::decode(self.send("GET", "/api/conversations", None)?)
    }

    fn create_conversation(&self, title: &str) -> Result<String, ApiError> {
        let body = TitleRequest {
            title: title.to_string(),
        };
        let created: CreatedConversation =
            Self::decode(self.send_json("POST", "/api/conversations", &body)?)?;
        created.resolved_id().ok_or(ApiError::MissingId)
    }

    fn rename_conversation(&self, id: &str, title: &str) -> Result<(), ApiError> {
        let body = TitleRequest {
            title: title.to_string(),
        };
        self.send_json("PATCH", &format!("/api/conversations/{id}"), &body)?;
        Ok(())
    }

    fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        self.send("DELETE", &format!("/api/conversations/{id}"), None)?;
        Ok(())
    }

    fn load_history(&self, id: &str) -> Result<Vec<HistoryItem>, ApiError> {
        let response: HistoryResponse =
            Self::decode(self.send("GET", &format!("/api/conversations/{id}/history"), None)?)?;
        Ok(response.history)
    }

    fn append_history(&self, id: &str, exchange: &Exchange) -> Result<(), ApiError> {
        self.send_json("POST", &format!("/api/conversations/{id}/history"), exchange)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = HttpApi::new("http://localhost:8000/");
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/api/conversations"), "http://localhost:8000/api/conversations");
    }

    #[test]
    fn unreachable_backend_is_transport_error() {
        // Port 9 (discard) is not expected to accept HTTP connections.
        let api = HttpApi::from_config(&HistoryConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..HistoryConfig::default()
        });
        assert!(matches!(api.list_conversations(), Err(ApiError::Transport(_))));
    }
}
