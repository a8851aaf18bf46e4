//! HTTP transport seam
//!
//! The driver core never owns a socket: it hands a fully formed POST to an
//! injected [`HttpTransport`] and gets back a status plus body. Timeouts,
//! retries, and cancellation all live behind this trait, not in the core.
//! Tests inject an in-memory transport.

use async_trait::async_trait;

use crate::error::{DatabaseError, DriverResult};

/// Raw response handed back by a transport. `status_text` is the reason
/// phrase of the status line; it seeds synthesized error bodies when the
/// payload is not parseable JSON.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The raw status line, e.g. `401 Unauthorized`.
    pub fn status_line(&self) -> String {
        if self.status_text.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.status_text)
        }
    }
}

/// A single HTTP POST primitive. Implementations return `Err` only for
/// failures that produced no response at all; non-2xx statuses come back as
/// ordinary [`TransportResponse`]s for the driver to interpret.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: String,
    ) -> DriverResult<TransportResponse>;
}

/// Default transport backed by a shared `reqwest` client (connection
/// keep-alive and pooling come for free).
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: String,
    ) -> DriverResult<TransportResponse> {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| DatabaseError::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DatabaseError::transport(e.to_string()))?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_includes_reason_phrase() {
        let response = TransportResponse {
            status: 401,
            status_text: "Unauthorized".to_string(),
            body: String::new(),
        };
        assert_eq!(response.status_line(), "401 Unauthorized");
        assert!(!response.is_success());
    }

    #[test]
    fn status_line_without_reason_phrase() {
        let response = TransportResponse {
            status: 599,
            status_text: String::new(),
            body: String::new(),
        };
        assert_eq!(response.status_line(), "599");
    }
}
