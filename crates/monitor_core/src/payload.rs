use serde::{Deserialize, Serialize};

use crate::frame::{ClassifiedMessage, InterceptedFrame};
use crate::relevance::{KeywordHit, RelevanceAssessment, StructureHit};

pub const PAYLOAD_SOURCE: &str = "bat-chat-websocket";
pub const PAYLOAD_TRANSPORT: &str = "websocket";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

/// Relevance evidence attached to forwarded text messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingFilter {
    pub score: u32,
    pub numbers_count: u32,
    pub keyword_hits: Vec<KeywordHit>,
    pub structure_hits: Vec<StructureHit>,
    pub symbol_count: u32,
    pub reasons: Vec<String>,
}

impl From<&RelevanceAssessment> for TradingFilter {
    fn from(assessment: &RelevanceAssessment) -> Self {
        Self {
            score: assessment.score,
            numbers_count: assessment.numbers_count,
            keyword_hits: assessment.keyword_hits.clone(),
            structure_hits: assessment.structure_hits.clone(),
            symbol_count: assessment.symbol_count,
            reasons: assessment.reasons.clone(),
        }
    }
}

/// JSON body POSTed to the configured endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    pub timestamp: String,
    pub source: String,
    pub transport: String,
    pub url: String,
    pub encoding: PayloadEncoding,
    /// Decoded text when available, otherwise base64.
    pub data: String,
    pub original_base64: String,
    pub is_text: bool,
    pub hex_preview: Option<String>,
    pub text_preview: Option<String>,
    pub raw_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_json: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trading_filter: Option<TradingFilter>,
}

impl OutboundPayload {
    pub fn build(
        frame: &InterceptedFrame,
        message: &ClassifiedMessage,
        assessment: Option<&RelevanceAssessment>,
    ) -> Self {
        let (encoding, data) = match message.decoded_text.as_deref() {
            Some(text) if message.is_text => (PayloadEncoding::Utf8, text.to_string()),
            _ => (PayloadEncoding::Base64, message.base64.clone()),
        };

        Self {
            timestamp: frame.timestamp_utc.clone(),
            source: PAYLOAD_SOURCE.to_string(),
            transport: PAYLOAD_TRANSPORT.to_string(),
            url: frame.url.clone(),
            encoding,
            data,
            original_base64: message.base64.clone(),
            is_text: message.is_text,
            hex_preview: non_empty(&message.hex_preview),
            text_preview: non_empty(&message.text_preview),
            raw_preview: non_empty(&frame.raw_preview),
            parsed_json: message.parsed_json.clone(),
            trading_filter: assessment.map(TradingFilter::from),
        }
    }

    /// Log-friendly view: base64 data is replaced by its length.
    pub fn log_preview(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if self.encoding == PayloadEncoding::Base64 {
            if let Some(object) = value.as_object_mut() {
                object.insert(
                    "data".to_string(),
                    serde_json::Value::String(format!("[base64:{}]", self.data.len())),
                );
                object.remove("originalBase64");
            }
        }
        value
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
