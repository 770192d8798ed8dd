use std::fmt;

/// Response of a successful (2xx) delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DeliveryError {
    pub kind: DeliveryFailureKind,
    pub message: String,
}

impl DeliveryError {
    pub(crate) fn new(kind: DeliveryFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFailureKind {
    HttpStatus(u16),
    Timeout,
    Network,
    Serialize,
    ClientSetup,
}

impl fmt::Display for DeliveryFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            DeliveryFailureKind::Timeout => write!(f, "timeout"),
            DeliveryFailureKind::Network => write!(f, "network error"),
            DeliveryFailureKind::Serialize => write!(f, "payload serialization failed"),
            DeliveryFailureKind::ClientSetup => write!(f, "http client setup failed"),
        }
    }
}

/// Relevance verdict published back to the page side for each scored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterFeedback {
    pub url: String,
    pub timestamp: String,
    pub is_trading: bool,
    pub score: u32,
    pub reasons: Vec<String>,
}
