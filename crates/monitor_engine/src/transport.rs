//! Client sockets over `tokio-tungstenite`.

use std::sync::{Mutex, PoisonError};

use futures_util::StreamExt;
use monitor_logging::{monitor_debug, monitor_trace};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::intercept::{
    BlobHandle, EventSocket, FramePayload, SocketEvent, SocketFactory, SocketListener,
};

/// How binary frames are surfaced to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryType {
    #[default]
    Blob,
    ArrayBuffer,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid socket url {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported socket scheme {0:?}; expected ws or wss")]
    UnsupportedScheme(String),
    #[error("invalid subprotocol list {0:?}")]
    InvalidProtocol(String),
    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteFactory {
    pub binary_type: BinaryType,
}

impl TungsteniteFactory {
    pub fn new(binary_type: BinaryType) -> Self {
        Self { binary_type }
    }
}

impl SocketFactory for TungsteniteFactory {
    type Socket = TungsteniteSocket;
    type Error = TransportError;

    /// Validates the URL and prepares the socket; nothing connects until
    /// [`TungsteniteSocket::run`].
    fn open(&self, url: &str, protocols: &[String]) -> Result<Self::Socket, Self::Error> {
        let parsed = Url::parse(url).map_err(|source| TransportError::InvalidUrl {
            input: url.to_string(),
            source,
        })?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            other => return Err(TransportError::UnsupportedScheme(other.to_string())),
        }
        if let Some(bad) = protocols
            .iter()
            .find(|p| p.is_empty() || p.contains(|c: char| c == ',' || c.is_whitespace()))
        {
            return Err(TransportError::InvalidProtocol(bad.clone()));
        }

        Ok(TungsteniteSocket {
            url: url.to_string(),
            protocols: protocols.to_vec(),
            binary_type: self.binary_type,
            listeners: Mutex::new(Vec::new()),
        })
    }
}

pub struct TungsteniteSocket {
    url: String,
    protocols: Vec<String>,
    binary_type: BinaryType,
    listeners: Mutex<Vec<SocketListener>>,
}

impl EventSocket for TungsteniteSocket {
    fn url(&self) -> &str {
        &self.url
    }

    fn add_listener(&self, listener: SocketListener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

impl TungsteniteSocket {
    pub fn binary_type(&self) -> BinaryType {
        self.binary_type
    }

    /// Connect and pump frames to listeners until the connection ends.
    /// A `Close` event is always dispatched once the handshake succeeded.
    pub async fn run(&self) -> Result<(), TransportError> {
        let mut request = self.url.as_str().into_client_request()?;
        if !self.protocols.is_empty() {
            let joined = self.protocols.join(", ");
            let value = HeaderValue::from_str(&joined)
                .map_err(|_| TransportError::InvalidProtocol(joined.clone()))?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let (mut stream, _response) = match tokio_tungstenite::connect_async(request).await {
            Ok(connected) => connected,
            Err(err) => {
                self.dispatch(&SocketEvent::Error(err.to_string()));
                return Err(err.into());
            }
        };
        self.dispatch(&SocketEvent::Open);

        let mut close = SocketEvent::Close {
            code: None,
            reason: String::new(),
        };
        while let Some(next) = stream.next().await {
            match next {
                Ok(Message::Text(text)) => {
                    self.dispatch(&SocketEvent::Message(FramePayload::Text(
                        text.as_str().to_owned(),
                    )));
                }
                Ok(Message::Binary(bytes)) => {
                    let payload = match self.binary_type {
                        BinaryType::ArrayBuffer => FramePayload::ArrayBuffer(bytes.to_vec()),
                        BinaryType::Blob => FramePayload::Blob(BlobHandle::from_bytes(bytes.to_vec())),
                    };
                    self.dispatch(&SocketEvent::Message(payload));
                }
                Ok(Message::Close(frame)) => {
                    if let Some(frame) = frame {
                        close = SocketEvent::Close {
                            code: Some(u16::from(frame.code)),
                            reason: frame.reason.as_str().to_owned(),
                        };
                    }
                    break;
                }
                Ok(other) => monitor_trace!("Ignoring control frame on {}: {:?}", self.url, other),
                Err(err) => {
                    self.dispatch(&SocketEvent::Error(err.to_string()));
                    break;
                }
            }
        }

        monitor_debug!("Socket {} finished", self.url);
        self.dispatch(&close);
        Ok(())
    }

    fn dispatch(&self, event: &SocketEvent) {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(event);
        }
    }
}
