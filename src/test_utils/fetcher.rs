//! A [`RemoteFetch`] that replays canned responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use crate::config::{ConfigDocument, FetchError, RemoteFetch};

/// Replays a script of fetch results in order and records every request.
///
/// Running past the end of the script yields a `Network` error.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<ConfigDocument, FetchError>>>,
    requests: Mutex<Vec<String>>,
    delay: Option<Duration>,
    gate: Option<Arc<FetchGate>>,
}

/// Holds every fetch in flight until the test opens it.
#[derive(Debug, Default)]
pub struct FetchGate {
    started: Notify,
    open: Notify,
}

impl FetchGate {
    /// Wait until a fetch has reached the gate.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let the waiting fetch answer.
    pub fn open(&self) {
        self.open.notify_one();
    }

    async fn pass(&self) {
        self.started.notify_one();
        self.open.notified().await;
    }
}

impl ScriptedFetcher {
    /// A fetcher answering with `script`, one entry per call.
    pub fn new(script: Vec<Result<ConfigDocument, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
            gate: None,
        }
    }

    /// Block every answer on `gate`.
    pub fn with_gate(mut self, gate: Arc<FetchGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sleep for `delay` before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.requested_urls().len()
    }

    /// URLs requested so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

impl RemoteFetch for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<ConfigDocument, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());

        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        next.unwrap_or_else(|| {
            Err(FetchError::Network {
                url: url.to_string(),
                reason: "no scripted response left".to_string(),
            })
        })
    }
}
