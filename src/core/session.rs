//! Capture session
//!
//! A [`CaptureSession`] ties one packet source to one [`NodeRegistry`] for
//! the lifetime of a capture run. It owns the registry (there is no global
//! one), drives the ingest loop on a background task, and broadcasts events
//! so a display layer can follow along without touching registry internals.
//!
//! Concurrency discipline: the registry sits behind a single `RwLock`. Each
//! ingested packet takes one write critical section; readers get cloned
//! snapshots. Capture rates are well under a thousand packets per second, so
//! one lock is plenty.

use crate::core::node::NodeSummary;
use crate::core::packet::SharedPacket;
use crate::core::registry::NodeRegistry;
use crate::core::source::PacketSource;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Capture session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Ingest loop is running
    Running,
    /// The source was exhausted (end of a capture log)
    Finished,
    /// Stopped on request
    Stopped,
    /// The source failed
    Failed,
}

/// Events broadcast while capturing
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A packet was decoded and filed in the registry
    PacketCaptured(SharedPacket),
    /// A node was seen for the first time
    NodeDiscovered {
        /// Address of the new node
        address: String,
    },
    /// The session changed state
    StateChanged(CaptureState),
    /// The source reported an error; the session is over
    Error(String),
}

/// An active capture run.
pub struct CaptureSession {
    name: String,
    source_info: String,
    registry: Arc<RwLock<NodeRegistry>>,
    state: Arc<RwLock<CaptureState>>,
    event_tx: broadcast::Sender<CaptureEvent>,
    stop_tx: mpsc::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl CaptureSession {
    /// Start capturing from `source`.
    ///
    /// The ingest loop runs on a spawned task until the source ends, fails,
    /// or [`stop`](Self::stop) is called.
    pub fn start(name: &str, mut source: Box<dyn PacketSource>) -> Self {
        let registry = Arc::new(RwLock::new(NodeRegistry::new()));
        let state = Arc::new(RwLock::new(CaptureState::Running));
        let (event_tx, _) = broadcast::channel(1024);
        let (stop_tx, mut stop_rx) = mpsc::channel(1);
        let source_info = source.source_info();

        let loop_registry = registry.clone();
        let loop_state = state.clone();
        let loop_event_tx = event_tx.clone();

        let task = tokio::spawn(async move {
            let mut seq = 0u64;
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        *loop_state.write() = CaptureState::Stopped;
                        let _ = loop_event_tx.send(CaptureEvent::StateChanged(CaptureState::Stopped));
                        break;
                    }
                    result = source.next_packet() => match result {
                        Ok(Some(mut packet)) => {
                            packet.seq = seq;
                            seq += 1;
                            let packet: SharedPacket = Arc::new(packet);

                            let ingested = loop_registry.write().ingest(packet.clone());
                            match ingested {
                                Ok(discovered) => {
                                    for address in discovered {
                                        tracing::info!(%address, "node discovered");
                                        let _ = loop_event_tx
                                            .send(CaptureEvent::NodeDiscovered { address });
                                    }
                                    let _ = loop_event_tx.send(CaptureEvent::PacketCaptured(packet));
                                }
                                Err(e) => {
                                    // Pipeline policy for invalid addresses:
                                    // drop the packet, keep the capture alive.
                                    tracing::warn!(error = %e, "dropping packet");
                                }
                            }
                        }
                        Ok(None) => {
                            *loop_state.write() = CaptureState::Finished;
                            let _ = loop_event_tx.send(CaptureEvent::StateChanged(CaptureState::Finished));
                            break;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "packet source failed");
                            *loop_state.write() = CaptureState::Failed;
                            let _ = loop_event_tx.send(CaptureEvent::Error(e.to_string()));
                            let _ = loop_event_tx.send(CaptureEvent::StateChanged(CaptureState::Failed));
                            break;
                        }
                    }
                }
            }
        });

        Self {
            name: name.to_string(),
            source_info,
            registry,
            state,
            event_tx,
            stop_tx,
            task: Some(task),
        }
    }

    /// Session name, for display.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description of the packet source feeding this session.
    pub fn source_info(&self) -> &str {
        &self.source_info
    }

    /// Current state.
    pub fn state(&self) -> CaptureState {
        *self.state.read()
    }

    /// Check whether the ingest loop is still running.
    pub fn is_running(&self) -> bool {
        *self.state.read() == CaptureState::Running
    }

    /// Subscribe to capture events.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.event_tx.subscribe()
    }

    /// Ask the ingest loop to stop. Idempotent.
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(()).await;
    }

    /// Wait for the ingest loop to end.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Snapshot of all known nodes, in discovery order.
    ///
    /// Cloned summaries: the returned value does not observe nodes created
    /// after the call.
    pub fn snapshot(&self) -> Vec<NodeSummary> {
        self.registry.read().summaries()
    }

    /// Number of nodes discovered so far.
    pub fn node_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Cloned packet history for one node, in arrival order.
    pub fn packets_for(&self, address: &str) -> Option<Vec<SharedPacket>> {
        self.registry
            .read()
            .get(address)
            .map(|node| node.packets().to_vec())
    }
}
