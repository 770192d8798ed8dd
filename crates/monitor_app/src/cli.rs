use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use monitor_engine::BinaryType;

use crate::logging::LogDestination;

/// Watch chat WebSockets and forward trading-relevant messages to a webhook.
#[derive(Parser, Debug)]
#[command(name = "bat-chat-monitor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file, created on first save.
    #[arg(long, default_value = ".monitor_settings.ron")]
    pub settings: PathBuf,

    /// Forwarding endpoint (absolute http or https URL); persisted to the settings file.
    #[arg(long)]
    pub target_url: Option<String>,

    /// Remove the persisted forwarding endpoint.
    #[arg(long, conflicts_with = "target_url")]
    pub clear_target_url: bool,

    /// Only log messages that pass the relevance filter at info level.
    #[arg(long)]
    pub only_filtered: Option<bool>,

    /// Connection-URL substring identifying sockets to intercept.
    #[arg(long)]
    pub target_host: Option<String>,

    /// How binary frames are surfaced.
    #[arg(long, value_enum, default_value_t = BinaryTypeArg::Blob)]
    pub binary_type: BinaryTypeArg,

    /// WebSocket subprotocols to request.
    #[arg(long = "protocol")]
    pub protocols: Vec<String>,

    /// Connect timeout for webhook deliveries, in seconds. Unset leaves it
    /// to the transport.
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogArg::Both)]
    pub log: LogArg,

    /// Seconds between settings file checks; 0 disables reloading.
    #[arg(long, default_value_t = 2)]
    pub reload_secs: u64,

    /// Socket URLs to open.
    #[arg(required = true)]
    pub sockets: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryTypeArg {
    Blob,
    Arraybuffer,
}

impl From<BinaryTypeArg> for BinaryType {
    fn from(arg: BinaryTypeArg) -> Self {
        match arg {
            BinaryTypeArg::Blob => BinaryType::Blob,
            BinaryTypeArg::Arraybuffer => BinaryType::ArrayBuffer,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogArg {
    File,
    Terminal,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::File => LogDestination::File,
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::Both => LogDestination::Both,
        }
    }
}
