//! Shared in-memory transport for integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlgate::{DatabaseError, DriverResult, HttpTransport, TransportResponse};

/// One request as seen by the transport.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body should be JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Transport that replays a queue of canned responses and records every
/// request it sees.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<TransportResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enqueue(&self, status: u16, status_text: &str, body: &str) {
        self.replies.lock().unwrap().push_back(TransportResponse {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        });
    }

    pub fn enqueue_ok(&self, body: &str) {
        self.enqueue(200, "OK", body);
    }

    pub fn enqueue_ok_json(&self, body: serde_json::Value) {
        self.enqueue_ok(&body.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: String,
    ) -> DriverResult<TransportResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            body,
        });

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DatabaseError::transport("no canned reply queued"))
    }
}
