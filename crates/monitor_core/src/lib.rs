//! Monitor core: pure classification, scoring and forwarding decisions.
mod classify;
mod codec;
mod config;
mod frame;
mod gate;
mod lexicon;
mod payload;
mod relevance;

pub use classify::{
    analyze_text, classify_bytes, classify_frame, classify_text, TextAnalysis,
    SUSPICIOUS_RATIO_LIMIT,
};
pub use codec::{
    base64_to_bytes, bytes_to_base64, bytes_to_hex_preview, decode_utf8_lossy,
    looks_like_base64, sanitize_preview, string_to_base64, HEX_PREVIEW_MAX, TEXT_PREVIEW_MAX,
};
pub use config::{parse_target_url, ConfigChange, ConfigError, MonitorConfig, DEFAULT_TARGET_HOST};
pub use frame::{ClassifiedMessage, InterceptedFrame, RawKind};
pub use gate::{decide, ForwardReason, GateDecision, SkipReason};
pub use payload::{
    OutboundPayload, PayloadEncoding, TradingFilter, PAYLOAD_SOURCE, PAYLOAD_TRANSPORT,
};
pub use relevance::{
    normalize_text, KeywordHit, RelevanceAssessment, RelevanceScorer, ScorerError, StructureHit,
    REASON_EMPTY_TEXT, REASON_NO_TEXT, TRADING_THRESHOLD,
};
pub use url::Url;
