//! Monitor engine: socket interception, relay, delivery and settings IO.
mod bridge;
mod forward;
mod intercept;
mod relay;
mod settings;
mod transport;
mod types;

pub use bridge::{
    bridge_channel, BridgeEvent, BridgeEventKind, BridgeReceiver, BridgeSender,
    InterceptedMessage, BRIDGE_ID,
};
pub use forward::{ForwardSettings, Forwarder, ReqwestForwarder};
pub use intercept::{
    utc_clock, BlobHandle, BlobSource, Clock, EventSocket, FramePayload, FrameTap,
    InterceptingFactory, SocketEvent, SocketFactory, SocketListener, TapError,
};
pub use relay::{Relay, RelayStats, StatsSnapshot};
pub use settings::{
    load_settings, read_settings, save_settings, spawn_settings_reloader, ConfigHandle,
    SettingsError,
};
pub use transport::{BinaryType, TransportError, TungsteniteFactory, TungsteniteSocket};
pub use types::{DeliveryError, DeliveryFailureKind, DeliveryReport, FilterFeedback};
