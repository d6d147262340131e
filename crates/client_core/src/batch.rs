use std::sync::Arc;

use shared::protocol::{BatchEntry, BatchStatistics, MAX_BATCH_TEXTS};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::{error::SessionError, gateway::SentimentGateway, session::SessionPhase};

#[derive(Debug, Clone)]
pub enum BatchEvent {
    Submitted { count: usize },
    Completed { count: usize },
    Failed { error: SessionError },
    Cleared,
}

#[derive(Debug, Clone)]
pub struct BatchSnapshot {
    pub inputs: Vec<String>,
    pub phase: SessionPhase,
    pub results: Vec<BatchEntry>,
    pub statistics: Option<BatchStatistics>,
}

impl BatchSnapshot {
    pub fn error(&self) -> Option<&SessionError> {
        self.phase.error()
    }
}

struct BatchState {
    inputs: Vec<String>,
    phase: SessionPhase,
    results: Vec<BatchEntry>,
    statistics: Option<BatchStatistics>,
    request_seq: u64,
}

/// Multi-text sibling of `AnalysisSession`. One batch at a time; the
/// stored result set is replaced wholesale on success and left untouched
/// on failure (no partial application). The batch itself is the unit of
/// review, so there is no rolling history here.
pub struct BatchSession {
    gateway: Arc<dyn SentimentGateway>,
    preprocess: bool,
    inner: Mutex<BatchState>,
    events: broadcast::Sender<BatchEvent>,
}

impl BatchSession {
    pub fn new(gateway: Arc<dyn SentimentGateway>) -> Self {
        Self::with_preprocess(gateway, true)
    }

    pub fn with_preprocess(gateway: Arc<dyn SentimentGateway>, preprocess: bool) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            gateway,
            preprocess,
            inner: Mutex::new(BatchState {
                inputs: Vec::new(),
                phase: SessionPhase::Idle,
                results: Vec::new(),
                statistics: None,
                request_seq: 0,
            }),
            events,
        }
    }

    /// Dispatches one batch. An empty collection or one beyond the
    /// gateway's bound fails locally without a network call; result order
    /// tracks input order in the reply.
    pub async fn submit(&self, texts: &[String]) {
        let seq = {
            let mut state = self.inner.lock().await;
            if state.phase.is_loading() {
                debug!("batch: submit ignored while a request is in flight");
                return;
            }
            if texts.is_empty() {
                state.phase = SessionPhase::Failed(SessionError::EmptyBatch);
                drop(state);
                let _ = self.events.send(BatchEvent::Failed {
                    error: SessionError::EmptyBatch,
                });
                return;
            }
            if texts.len() > MAX_BATCH_TEXTS {
                let error = SessionError::BatchTooLarge {
                    max: MAX_BATCH_TEXTS,
                };
                state.phase = SessionPhase::Failed(error.clone());
                drop(state);
                let _ = self.events.send(BatchEvent::Failed { error });
                return;
            }
            state.inputs = texts.to_vec();
            state.phase = SessionPhase::Loading;
            state.request_seq += 1;
            state.request_seq
        };
        let _ = self.events.send(BatchEvent::Submitted { count: texts.len() });
        debug!(count = texts.len(), "batch: dispatching request");

        let outcome = self.gateway.analyze_batch(texts, self.preprocess).await;

        let mut state = self.inner.lock().await;
        if state.request_seq != seq {
            debug!("batch: dropping response for a superseded request");
            return;
        }
        match outcome {
            Ok(response) if response.success => {
                if response.results.len() != texts.len() {
                    warn!(
                        expected = texts.len(),
                        received = response.results.len(),
                        "batch: gateway returned a result count that does not match the inputs"
                    );
                }
                let count = response.results.len();
                state.results = response.results;
                state.statistics = response.statistics;
                state.phase = SessionPhase::Success;
                drop(state);
                let _ = self.events.send(BatchEvent::Completed { count });
            }
            Ok(response) => {
                let message = response
                    .error
                    .unwrap_or_else(|| "the gateway could not analyze this batch".to_string());
                warn!(message = %message, "batch: gateway reported failure");
                let error = SessionError::Analysis(message);
                state.phase = SessionPhase::Failed(error.clone());
                drop(state);
                let _ = self.events.send(BatchEvent::Failed { error });
            }
            Err(err) => {
                warn!("batch: request failed: {err:#}");
                state.phase = SessionPhase::Failed(SessionError::Connection);
                drop(state);
                let _ = self.events.send(BatchEvent::Failed {
                    error: SessionError::Connection,
                });
            }
        }
    }

    pub async fn clear(&self) {
        {
            let mut state = self.inner.lock().await;
            state.inputs.clear();
            state.results.clear();
            state.statistics = None;
            state.phase = SessionPhase::Idle;
            // Anything still in flight is now stale.
            state.request_seq += 1;
        }
        let _ = self.events.send(BatchEvent::Cleared);
    }

    pub async fn snapshot(&self) -> BatchSnapshot {
        let state = self.inner.lock().await;
        BatchSnapshot {
            inputs: state.inputs.clone(),
            phase: state.phase.clone(),
            results: state.results.clone(),
            statistics: state.statistics.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/batch_tests.rs"]
mod tests;
