//! Recording transport for tests.
//!
//! Responses are scripted in order; once the script runs out every request
//! gets an empty `200`. Each request is recorded so tests can assert on the
//! wire calls a command made, or that it made none.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Scripted [`Transport`] that records every request.
#[derive(Debug, Default)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
    reauths: AtomicUsize,
    reauth_error: Mutex<Option<ClientError>>,
}

impl FakeTransport {
    /// Creates a transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport whose first response is `value` with status 200.
    #[must_use]
    pub fn with_json(value: Value) -> Self {
        let fake = Self::new();
        fake.push_json(value);
        fake
    }

    /// Queues a raw response.
    pub fn push(&self, response: ApiResponse) -> &Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    /// Queues a 200 response carrying `value`.
    pub fn push_json(&self, value: Value) -> &Self {
        self.push(ApiResponse::json(&value))
    }

    /// Queues a response with `status` and a text body.
    pub fn push_status(&self, status: u16, body: &str) -> &Self {
        self.push(ApiResponse::new(status, body.as_bytes().to_vec()))
    }

    /// Queues a delivery failure.
    pub fn push_error(&self, error: ClientError) -> &Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Makes the next [`Transport::reauthenticate`] call fail.
    pub fn fail_reauth(&self, error: ClientError) {
        *self.reauth_error.lock() = Some(error);
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of re-authentications requested.
    #[must_use]
    pub fn reauth_count(&self) -> usize {
        self.reauths.load(Ordering::SeqCst)
    }

    fn next(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().push(request);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(200, Vec::new())))
    }

    fn reauth(&self) -> Result<()> {
        self.reauths.fetch_add(1, Ordering::SeqCst);
        self.reauth_error.lock().take().map_or(Ok(()), Err)
    }
}

impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.next(request)
    }

    async fn reauthenticate(&self) -> Result<()> {
        self.reauth()
    }
}
