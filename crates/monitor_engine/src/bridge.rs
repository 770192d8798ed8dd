//! Best-effort channel moving intercepted messages out of the socket context.

use monitor_core::{ClassifiedMessage, InterceptedFrame};
use monitor_logging::monitor_debug;
use tokio::sync::mpsc;

/// Identifier stamped on every event; receivers drop anything else.
pub const BRIDGE_ID: &str = "bat-chat-monitor";

#[derive(Debug, Clone, PartialEq)]
pub struct InterceptedMessage {
    pub frame: InterceptedFrame,
    pub message: ClassifiedMessage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEventKind {
    /// A target socket was wrapped; no message has been seen on it yet.
    Ready { url: String, timestamp: String },
    Message(Box<InterceptedMessage>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeEvent {
    pub bridge_id: String,
    pub kind: BridgeEventKind,
}

/// Unbounded and fire-and-forget: sends never block and never fail loudly.
#[derive(Debug, Clone)]
pub struct BridgeSender {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

#[derive(Debug)]
pub struct BridgeReceiver {
    rx: mpsc::UnboundedReceiver<BridgeEvent>,
}

pub fn bridge_channel() -> (BridgeSender, BridgeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (BridgeSender { tx }, BridgeReceiver { rx })
}

impl BridgeSender {
    pub fn dispatch(&self, kind: BridgeEventKind) {
        self.send_event(BridgeEvent {
            bridge_id: BRIDGE_ID.to_string(),
            kind,
        });
    }

    pub fn send_event(&self, event: BridgeEvent) {
        if self.tx.send(event).is_err() {
            monitor_debug!("Bridge receiver gone; event dropped");
        }
    }
}

impl BridgeReceiver {
    pub async fn recv(&mut self) -> Option<BridgeEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<BridgeEvent> {
        self.rx.try_recv().ok()
    }
}
