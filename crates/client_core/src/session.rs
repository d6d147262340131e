use std::sync::Arc;

use shared::protocol::SentimentResult;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::{
    error::SessionError,
    gateway::SentimentGateway,
    history::{HistoryEntry, RollingHistory},
};

/// How many past single-analysis results are retained for display.
pub const HISTORY_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Success,
    Failed(SessionError),
}

impl SessionPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionPhase::Loading)
    }

    pub fn error(&self) -> Option<&SessionError> {
        match self {
            SessionPhase::Failed(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Ask the gateway to run its preprocessing pass over submitted text.
    pub preprocess: bool,
    /// When set, `clear` also empties the history instead of leaving it for
    /// the explicit `clear_history`.
    pub clear_resets_history: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            preprocess: true,
            clear_resets_history: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    Submitted { text: String },
    Completed { result: SentimentResult },
    Failed { error: SessionError },
    Cleared,
    HistoryCleared,
}

/// Copy of the controller state for display: current input, lifecycle
/// phase, last result, and the bounded history (most recent first).
#[derive(Debug, Clone)]
pub struct AnalysisSnapshot {
    pub input: String,
    pub phase: SessionPhase,
    pub result: Option<SentimentResult>,
    pub history: Vec<HistoryEntry>,
}

impl AnalysisSnapshot {
    pub fn error(&self) -> Option<&SessionError> {
        self.phase.error()
    }
}

struct SessionState {
    input: String,
    phase: SessionPhase,
    result: Option<SentimentResult>,
    history: RollingHistory,
    request_seq: u64,
}

/// Single-text analysis state machine: Idle -> Loading -> Success or
/// Failed, back to Idle on clear. At most one request is outstanding per
/// session; observers get lifecycle events over the broadcast channel.
pub struct AnalysisSession {
    gateway: Arc<dyn SentimentGateway>,
    options: SessionOptions,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<AnalysisEvent>,
}

impl AnalysisSession {
    pub fn new(gateway: Arc<dyn SentimentGateway>) -> Self {
        Self::with_options(gateway, SessionOptions::default())
    }

    pub fn with_options(gateway: Arc<dyn SentimentGateway>, options: SessionOptions) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            gateway,
            options,
            inner: Mutex::new(SessionState {
                input: String::new(),
                phase: SessionPhase::Idle,
                result: None,
                history: RollingHistory::new(HISTORY_CAPACITY),
                request_seq: 0,
            }),
            events,
        }
    }

    /// Validates and dispatches one analysis request. Whitespace-only input
    /// fails locally without a network call; a submit while another request
    /// is in flight is ignored. A response that arrives after `clear`
    /// superseded its request is discarded rather than applied.
    pub async fn submit(&self, raw_text: &str) {
        let seq = {
            let mut state = self.inner.lock().await;
            if state.phase.is_loading() {
                debug!("analysis: submit ignored while a request is in flight");
                return;
            }
            if raw_text.trim().is_empty() {
                state.phase = SessionPhase::Failed(SessionError::EmptyInput);
                drop(state);
                let _ = self.events.send(AnalysisEvent::Failed {
                    error: SessionError::EmptyInput,
                });
                return;
            }
            state.input = raw_text.to_string();
            state.phase = SessionPhase::Loading;
            state.request_seq += 1;
            state.request_seq
        };
        let _ = self.events.send(AnalysisEvent::Submitted {
            text: raw_text.to_string(),
        });
        debug!(chars = raw_text.len(), "analysis: dispatching request");

        let outcome = self.gateway.analyze(raw_text, self.options.preprocess).await;

        let mut state = self.inner.lock().await;
        if state.request_seq != seq {
            debug!("analysis: dropping response for a superseded request");
            return;
        }
        match outcome {
            Ok(response) if response.success => match response.result {
                Some(result) => {
                    state.result = Some(result.clone());
                    state.history.record(result.clone());
                    state.phase = SessionPhase::Success;
                    drop(state);
                    let _ = self.events.send(AnalysisEvent::Completed { result });
                }
                None => {
                    warn!("analysis: success reply carried no result payload");
                    let error = SessionError::Analysis(
                        "the gateway returned no result".to_string(),
                    );
                    state.phase = SessionPhase::Failed(error.clone());
                    drop(state);
                    let _ = self.events.send(AnalysisEvent::Failed { error });
                }
            },
            Ok(response) => {
                let message = response
                    .error
                    .unwrap_or_else(|| "the gateway could not analyze this text".to_string());
                warn!(message = %message, "analysis: gateway reported failure");
                let error = SessionError::Analysis(message);
                state.phase = SessionPhase::Failed(error.clone());
                drop(state);
                let _ = self.events.send(AnalysisEvent::Failed { error });
            }
            Err(err) => {
                warn!("analysis: request failed: {err:#}");
                state.phase = SessionPhase::Failed(SessionError::Connection);
                drop(state);
                let _ = self.events.send(AnalysisEvent::Failed {
                    error: SessionError::Connection,
                });
            }
        }
    }

    /// Resets input, result, and error back to Idle. History stays unless
    /// the session was built with `clear_resets_history`.
    pub async fn clear(&self) {
        {
            let mut state = self.inner.lock().await;
            state.input.clear();
            state.result = None;
            state.phase = SessionPhase::Idle;
            // Anything still in flight is now stale.
            state.request_seq += 1;
            if self.options.clear_resets_history {
                state.history.clear();
            }
        }
        let _ = self.events.send(AnalysisEvent::Cleared);
    }

    pub async fn clear_history(&self) {
        self.inner.lock().await.history.clear();
        let _ = self.events.send(AnalysisEvent::HistoryCleared);
    }

    pub async fn snapshot(&self) -> AnalysisSnapshot {
        let state = self.inner.lock().await;
        AnalysisSnapshot {
            input: state.input.clone(),
            phase: state.phase.clone(),
            result: state.result.clone(),
            history: state.history.to_vec(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
