use std::{fmt, sync::Arc};

use shared::protocol::ModelInfo;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::gateway::SentimentGateway;

/// Reachability of the gateway. Starts at `Checking`; `Offline` is sticky
/// until a manual re-check (no background polling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Checking,
    Online,
    Offline,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServerStatus::Checking => "checking",
            ServerStatus::Online => "online",
            ServerStatus::Offline => "offline",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub enum ConnectivityEvent {
    StatusChanged(ServerStatus),
    ModelInfoLoaded(ModelInfo),
}

struct MonitorState {
    status: ServerStatus,
    model: Option<ModelInfo>,
    probe_seq: u64,
}

/// Probes the gateway's health endpoint and, on success, its model-info
/// endpoint. Drives the tri-state status that gates analysis features.
pub struct ConnectivityMonitor {
    gateway: Arc<dyn SentimentGateway>,
    inner: Mutex<MonitorState>,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    pub fn new(gateway: Arc<dyn SentimentGateway>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            gateway,
            inner: Mutex::new(MonitorState {
                status: ServerStatus::Checking,
                model: None,
                probe_seq: 0,
            }),
            events,
        }
    }

    /// Runs the probe sequence: health first, then best-effort model info.
    /// Both the startup probe and a manual retry go through here; a retry
    /// re-enters `Checking` before probing again. A probe superseded by a
    /// newer `check` discards its outcome.
    pub async fn check(&self) {
        let seq = {
            let mut state = self.inner.lock().await;
            state.probe_seq += 1;
            if state.status != ServerStatus::Checking {
                state.status = ServerStatus::Checking;
                let _ = self
                    .events
                    .send(ConnectivityEvent::StatusChanged(ServerStatus::Checking));
            }
            state.model = None;
            state.probe_seq
        };

        match self.gateway.check_health().await {
            Ok(health) => {
                {
                    let mut state = self.inner.lock().await;
                    if state.probe_seq != seq {
                        debug!("connectivity: dropping superseded probe outcome");
                        return;
                    }
                    state.status = ServerStatus::Online;
                }
                info!(status = %health.status, "connectivity: gateway is reachable");
                let _ = self
                    .events
                    .send(ConnectivityEvent::StatusChanged(ServerStatus::Online));

                match self.gateway.model_info().await {
                    Ok(info) => {
                        {
                            let mut state = self.inner.lock().await;
                            if state.probe_seq != seq {
                                debug!("connectivity: dropping superseded model info");
                                return;
                            }
                            state.model = Some(info.clone());
                        }
                        info!(model = %info.model_name, "connectivity: model info loaded");
                        let _ = self.events.send(ConnectivityEvent::ModelInfoLoaded(info));
                    }
                    Err(err) => {
                        // Health already succeeded; stay online without metadata.
                        warn!("connectivity: model info unavailable: {err:#}");
                    }
                }
            }
            Err(err) => {
                {
                    let mut state = self.inner.lock().await;
                    if state.probe_seq != seq {
                        debug!("connectivity: dropping superseded probe outcome");
                        return;
                    }
                    state.status = ServerStatus::Offline;
                }
                warn!("connectivity: health probe failed: {err:#}");
                let _ = self
                    .events
                    .send(ConnectivityEvent::StatusChanged(ServerStatus::Offline));
            }
        }
    }

    pub async fn status(&self) -> ServerStatus {
        self.inner.lock().await.status
    }

    pub async fn is_online(&self) -> bool {
        self.status().await == ServerStatus::Online
    }

    pub async fn model_info(&self) -> Option<ModelInfo> {
        self.inner.lock().await.model.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/connectivity_tests.rs"]
mod tests;
