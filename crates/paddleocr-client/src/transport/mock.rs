//! Recording transport double for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Transport, TransportRequest, TransportResponse};
use crate::{Error, ErrorKind, Result};

#[derive(Debug, Default)]
struct MockTransportInner {
    responses: Mutex<VecDeque<Result<TransportResponse>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

/// In-memory [`Transport`] that records every request and replays queued
/// responses in order.
///
/// Clones share state, so a test can keep one handle for assertions while the
/// client owns the other. When the queue is empty, calls fail with a
/// [`ErrorKind::NetworkError`].
///
/// # Example
///
/// ```rust,ignore
/// let transport = MockTransport::new()
///     .with_json(200, serde_json::json!({ "status": "healthy" }));
/// let client = OcrClient::from_transport(transport.clone());
///
/// client.health_check().await?;
/// assert_eq!(transport.call_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<MockTransportInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Creates a transport with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn with_response(self, response: TransportResponse) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queues a JSON response with the given status.
    pub fn with_json(self, status: u16, body: serde_json::Value) -> Self {
        self.with_response(TransportResponse::json(status, &body))
    }

    /// Queues a transport failure.
    pub fn with_error(self, error: Error) -> Self {
        self.push(Err(error));
        self
    }

    /// Queues an outcome on a shared handle.
    pub fn push(&self, outcome: Result<TransportResponse>) {
        lock(&self.inner.responses).push_back(outcome);
    }

    /// Number of requests executed so far.
    pub fn call_count(&self) -> usize {
        lock(&self.inner.requests).len()
    }

    /// Snapshot of every request executed so far, in call order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        lock(&self.inner.requests).clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<TransportRequest> {
        lock(&self.inner.requests).last().cloned()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        lock(&self.inner.requests).push(request);

        lock(&self.inner.responses).pop_front().unwrap_or_else(|| {
            Err(Error::new(ErrorKind::NetworkError).with_message("no canned response queued"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let transport = MockTransport::new()
            .with_json(200, serde_json::json!({ "n": 1 }))
            .with_error(Error::new(ErrorKind::Timeout));

        let first = transport
            .execute(TransportRequest::get("/a"))
            .await
            .unwrap();
        assert_eq!(first.text(), "{\"n\":1}");

        let second = transport
            .execute(TransportRequest::get("/b"))
            .await
            .unwrap_err();
        assert!(second.is_timeout());

        let third = transport
            .execute(TransportRequest::get("/c"))
            .await
            .unwrap_err();
        assert_eq!(third.kind, ErrorKind::NetworkError);

        assert_eq!(transport.call_count(), 3);
        assert_eq!(transport.last_request().unwrap().path, "/c");
    }
}
