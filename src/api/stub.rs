//! In-memory [`SpendingSource`] for tests.

use crate::api::source::SpendingSource;
use crate::error::ApiError;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serves canned bodies per (path, fiscal year); everything else is a 404.
#[derive(Debug, Default)]
pub struct StubSource {
    bodies: HashMap<(String, i32), Value>,
    statuses: HashMap<(String, i32), u16>,
    undecodable: HashSet<(String, i32)>,
    delay: Option<Duration>,
    requests: Mutex<Vec<(String, i32)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `path` for `year` with HTTP 200 and `body`.
    pub fn with(mut self, path: &str, year: i32, body: Value) -> Self {
        self.bodies.insert((path.to_string(), year), body);
        self
    }

    /// Answer `path` for `year` with a non-200 status.
    pub fn with_status(mut self, path: &str, year: i32, status: u16) -> Self {
        self.statuses.insert((path.to_string(), year), status);
        self
    }

    /// Answer `path` for `year` with HTTP 200 and a body that is not JSON.
    pub fn with_undecodable(mut self, path: &str, year: i32) -> Self {
        self.undecodable.insert((path.to_string(), year));
        self
    }

    /// Hold every request open for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<(String, i32)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Highest number of requests that were open at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl SpendingSource for StubSource {
    async fn get_json(&self, path: &str, fiscal_year: i32) -> Result<Value, ApiError> {
        let key = (path.to_string(), fiscal_year);
        self.requests.lock().unwrap().push(key.clone());

        let open = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(open, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.undecodable.contains(&key) {
            let source = serde_json::from_str::<Value>("<html>Service Unavailable</html>")
                .expect_err("markup is not JSON");
            return Err(ApiError::Decode {
                url: path.to_string(),
                source,
            });
        }

        if let Some(status) = self.statuses.get(&key) {
            return Err(ApiError::Status {
                status: *status,
                url: path.to_string(),
            });
        }

        self.bodies.get(&key).cloned().ok_or_else(|| ApiError::Status {
            status: 404,
            url: path.to_string(),
        })
    }
}
