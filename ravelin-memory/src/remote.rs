//! Remote key/value-backed message backend.
//!
//! Each session's full message log lives as one JSON document on a
//! remote key/value HTTP service, addressed by session id: `GET`/`PUT`/
//! `DELETE` against `{base_url}/v1/sessions/{session_id}`. Grounded the
//! same way this lineage's own provider crates talk to their model
//! APIs — a `reqwest::Client`, JSON bodies, HTTP-status-coded error
//! mapping — rather than inventing a bespoke protocol.

use ravelin_core::{Message, SessionId};

use crate::{filter_by_agent, MemoryBackend, MemoryError};

/// Message backend fronting a remote key/value HTTP service.
///
/// Appends are read-modify-write: fetch the session's current log,
/// push the new message with the next `seq`, and write the whole log
/// back. The service is trusted to serialize writes to a given key;
/// this backend does not add its own locking on top.
pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteBackend {
    /// Point the backend at a remote key/value service, e.g.
    /// `http://localhost:6380`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Use a pre-configured client (custom timeouts, auth headers, …)
    /// instead of a bare default one.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn session_url(&self, session_id: &SessionId) -> String {
        format!(
            "{}/v1/sessions/{}",
            self.base_url.trim_end_matches('/'),
            urlencode(session_id.as_str())
        )
    }

    async fn read_log(&self, session_id: &SessionId) -> Result<Vec<Message>, MemoryError> {
        let response = self
            .client
            .get(self.session_url(session_id))
            .send()
            .await
            .map_err(|e| MemoryError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::Unavailable(format!("HTTP {status}: {body}")));
        }
        response
            .json::<Vec<Message>>()
            .await
            .map_err(|e| MemoryError::Unavailable(e.to_string()))
    }

    async fn write_log(&self, session_id: &SessionId, messages: &[Message]) -> Result<(), MemoryError> {
        let response = self
            .client
            .put(self.session_url(session_id))
            .json(messages)
            .send()
            .await
            .map_err(|e| MemoryError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::Unavailable(format!("HTTP {status}: {body}")));
        }
        Ok(())
    }
}

fn urlencode(id: &str) -> String {
    let mut out = String::new();
    for byte in id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[async_trait::async_trait]
impl MemoryBackend for RemoteBackend {
    async fn append(&self, mut message: Message) -> Result<(), MemoryError> {
        let mut log = self.read_log(&message.session_id).await?;
        message.seq = log.len() as u64;
        log.push(message.clone());
        self.write_log(&message.session_id, &log).await
    }

    async fn get_messages(
        &self,
        session_id: &SessionId,
        agent_name: Option<&str>,
    ) -> Result<Vec<Message>, MemoryError> {
        let log = self.read_log(session_id).await?;
        Ok(filter_by_agent(log, agent_name))
    }

    async fn clear(&self, session_id: &SessionId) -> Result<(), MemoryError> {
        let response = self
            .client
            .delete(self.session_url(session_id))
            .send()
            .await
            .map_err(|e| MemoryError::Unavailable(e.to_string()))?;
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            let status = response.status();
            return Err(MemoryError::Unavailable(format!("HTTP {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_non_filename_safe_bytes() {
        assert_eq!(urlencode("background:agent/1"), "background%3Aagent%2F1");
        assert_eq!(urlencode("plain-id_1.2"), "plain-id_1.2");
    }

    #[test]
    fn session_url_joins_base_and_encoded_id() {
        let backend = RemoteBackend::new("http://localhost:6380/");
        assert_eq!(
            backend.session_url(&SessionId::new("s:1")),
            "http://localhost:6380/v1/sessions/s%3A1"
        );
    }
}
