//! Passive WebSocket interception.
//!
//! Sockets come from a [`SocketFactory`]. [`InterceptingFactory`] decorates any
//! factory: it always builds the real socket, hands back the inner factory's
//! own socket type and error untouched, and, when the connection URL contains
//! the configured target host, attaches a [`FrameTap`] as one more listener.
//! The tap classifies every inbound message and dispatches it over the bridge.
//! Nothing it does can reach the socket or the application's own listeners.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use monitor_core::{classify_frame, InterceptedFrame, RawKind};
use monitor_logging::{clip_for_log, monitor_debug, monitor_error, monitor_info};
use tokio::runtime::Handle;

use crate::bridge::{BridgeEventKind, BridgeSender, InterceptedMessage};
use crate::settings::ConfigHandle;

/// Produces ISO-8601 UTC timestamps for intercepted frames.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

pub fn utc_clock() -> Clock {
    Arc::new(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Binary payload whose bytes must be read asynchronously before use.
#[async_trait::async_trait]
pub trait BlobSource: Send + Sync {
    fn size(&self) -> u64;
    async fn read_all(&self) -> io::Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct BlobHandle {
    source: Arc<dyn BlobSource>,
}

impl BlobHandle {
    pub fn new(source: impl BlobSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(MemoryBlob(Arc::from(bytes)))
    }

    pub fn size(&self) -> u64 {
        self.source.size()
    }

    pub async fn materialize(&self) -> io::Result<Vec<u8>> {
        self.source.read_all().await
    }
}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHandle")
            .field("size", &self.size())
            .finish()
    }
}

struct MemoryBlob(Arc<[u8]>);

#[async_trait::async_trait]
impl BlobSource for MemoryBlob {
    fn size(&self) -> u64 {
        self.0.len() as u64
    }

    async fn read_all(&self) -> io::Result<Vec<u8>> {
        tokio::task::yield_now().await;
        Ok(self.0.to_vec())
    }
}

#[derive(Debug, Clone)]
pub enum FramePayload {
    Text(String),
    ArrayBuffer(Vec<u8>),
    Blob(BlobHandle),
}

#[derive(Debug, Clone)]
pub enum SocketEvent {
    Open,
    Close { code: Option<u16>, reason: String },
    Error(String),
    Message(FramePayload),
}

pub type SocketListener = Box<dyn Fn(&SocketEvent) + Send + Sync>;

/// A socket that delivers its events to registered listeners, in
/// registration order.
pub trait EventSocket {
    fn url(&self) -> &str;
    fn add_listener(&self, listener: SocketListener);
}

pub trait SocketFactory {
    type Socket: EventSocket;
    type Error;

    fn open(&self, url: &str, protocols: &[String]) -> Result<Self::Socket, Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum TapError {
    #[error("no async runtime available to read a {0}-byte blob")]
    NoRuntime(u64),
}

/// Listener body shared by every intercepted socket.
pub struct FrameTap {
    config: ConfigHandle,
    bridge: BridgeSender,
    clock: Clock,
}

impl FrameTap {
    pub fn new(config: ConfigHandle, bridge: BridgeSender) -> Self {
        Self {
            config,
            bridge,
            clock: utc_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn matches(&self, socket_url: &str) -> bool {
        self.config.snapshot().matches_socket_url(socket_url)
    }

    pub fn attach<S: EventSocket + ?Sized>(self: &Arc<Self>, socket: &S) {
        let url = socket.url().to_string();
        monitor_info!("Intercepted target WebSocket: {}", url);
        self.bridge.dispatch(BridgeEventKind::Ready {
            url: url.clone(),
            timestamp: (self.clock)(),
        });

        let tap = Arc::clone(self);
        socket.add_listener(Box::new(move |event| tap.observe(&url, event)));
    }

    /// Handle one socket event. Failures are logged and swallowed here.
    pub fn observe(&self, url: &str, event: &SocketEvent) {
        match event {
            SocketEvent::Open => monitor_info!("WebSocket connected: {}", url),
            SocketEvent::Close { code, reason } => {
                monitor_info!(
                    "WebSocket disconnected: {} (code {:?}, reason {:?})",
                    url,
                    code,
                    reason
                );
            }
            SocketEvent::Error(err) => monitor_error!("WebSocket error on {}: {}", url, err),
            SocketEvent::Message(payload) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.on_message(url, payload)));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => monitor_error!("Error processing message from {}: {}", url, err),
                    Err(_) => monitor_error!("Panic while processing message from {}; message dropped", url),
                }
            }
        }
    }

    fn on_message(&self, url: &str, payload: &FramePayload) -> Result<(), TapError> {
        let timestamp = (self.clock)();
        match payload {
            FramePayload::Text(text) => {
                emit_frame(&self.bridge, InterceptedFrame::text(url, timestamp, text));
            }
            FramePayload::ArrayBuffer(bytes) => {
                emit_frame(
                    &self.bridge,
                    InterceptedFrame::binary(url, timestamp, RawKind::ArrayBuffer, bytes.clone()),
                );
            }
            FramePayload::Blob(blob) => {
                let runtime = Handle::try_current().map_err(|_| TapError::NoRuntime(blob.size()))?;
                let blob = blob.clone();
                let bridge = self.bridge.clone();
                let url = url.to_string();
                monitor_debug!("Reading {}-byte blob from {}", blob.size(), url);
                runtime.spawn(async move {
                    match blob.materialize().await {
                        Ok(bytes) => emit_frame(
                            &bridge,
                            InterceptedFrame::binary(url, timestamp, RawKind::Blob, bytes),
                        ),
                        Err(err) => monitor_error!("Failed to read blob from {}: {}", url, err),
                    }
                });
            }
        }
        Ok(())
    }
}

fn emit_frame(bridge: &BridgeSender, frame: InterceptedFrame) {
    let message = classify_frame(&frame);
    match message.decoded_text.as_deref() {
        Some(text) => monitor_debug!(
            "Decoded {} message from {}: {}",
            frame.raw_kind,
            frame.url,
            clip_for_log(text)
        ),
        None => monitor_debug!(
            "Binary {} message from {}: hex [{}] preview [{}]",
            frame.raw_kind,
            frame.url,
            message.hex_preview,
            message.text_preview
        ),
    }
    bridge.dispatch(BridgeEventKind::Message(Box::new(InterceptedMessage {
        frame,
        message,
    })));
}

/// Decorator over a [`SocketFactory`] that taps sockets bound for the target host.
pub struct InterceptingFactory<F> {
    inner: F,
    tap: Arc<FrameTap>,
}

impl<F> InterceptingFactory<F> {
    pub fn new(inner: F, tap: FrameTap) -> Self {
        Self {
            inner,
            tap: Arc::new(tap),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: SocketFactory> SocketFactory for InterceptingFactory<F> {
    type Socket = F::Socket;
    type Error = F::Error;

    fn open(&self, url: &str, protocols: &[String]) -> Result<Self::Socket, Self::Error> {
        let socket = self.inner.open(url, protocols)?;
        if self.tap.matches(url) {
            self.tap.attach(&socket);
        } else {
            monitor_debug!("Socket {} does not match the target host; not intercepted", url);
        }
        Ok(socket)
    }
}
