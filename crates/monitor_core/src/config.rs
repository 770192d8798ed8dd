use serde::{Deserialize, Serialize};
use url::Url;

/// Connection-URL substring that marks a socket for interception.
pub const DEFAULT_TARGET_HOST: &str = "wsd.baaaat.com/ws";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target url is empty")]
    Empty,
    #[error("invalid target url {input:?}: {source}")]
    Invalid {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("target url must use http or https, got {0:?}")]
    UnsupportedScheme(String),
}

/// Settings consumed by the pipeline. Readers hold an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Forwarding destination; `None` disables delivery.
    pub target_url: Option<Url>,
    /// Demote per-message logs of messages the relevance filter rejects.
    pub only_log_filtered_messages: bool,
    pub target_host: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target_url: None,
            only_log_filtered_messages: false,
            target_host: DEFAULT_TARGET_HOST.to_string(),
        }
    }
}

/// One externally delivered settings update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    TargetUrl(Option<Url>),
    OnlyLogFiltered(bool),
    TargetHost(String),
}

impl MonitorConfig {
    /// An empty host filter intercepts nothing.
    pub fn matches_socket_url(&self, socket_url: &str) -> bool {
        !self.target_host.is_empty() && socket_url.contains(&self.target_host)
    }

    pub fn apply(&mut self, change: ConfigChange) {
        match change {
            ConfigChange::TargetUrl(url) => self.target_url = url,
            ConfigChange::OnlyLogFiltered(flag) => self.only_log_filtered_messages = flag,
            ConfigChange::TargetHost(host) => self.target_host = host,
        }
    }
}

/// Validate a user-supplied destination as an absolute http(s) URL.
pub fn parse_target_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty);
    }
    let url = Url::parse(trimmed).map_err(|source| ConfigError::Invalid {
        input: trimmed.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
