use monitor_logging::{monitor_debug, monitor_trace};

use crate::codec::{
    base64_to_bytes, bytes_to_base64, bytes_to_hex_preview, decode_utf8_lossy,
    looks_like_base64, sanitize_preview, string_to_base64, HEX_PREVIEW_MAX, TEXT_PREVIEW_MAX,
};
use crate::frame::{ClassifiedMessage, InterceptedFrame, RawKind};

/// Decodings with this share of suspicious characters or more are binary.
pub const SUSPICIOUS_RATIO_LIMIT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAnalysis {
    pub total_chars: usize,
    pub suspicious_chars: usize,
}

impl TextAnalysis {
    pub fn ratio(&self) -> f64 {
        if self.total_chars == 0 {
            0.0
        } else {
            self.suspicious_chars as f64 / self.total_chars as f64
        }
    }

    pub fn is_text(&self) -> bool {
        self.ratio() < SUSPICIOUS_RATIO_LIMIT
    }
}

/// Count control characters (other than tab, LF, CR) and replacement characters.
pub fn analyze_text(text: &str) -> TextAnalysis {
    let mut total_chars = 0;
    let mut suspicious_chars = 0;
    for ch in text.chars() {
        total_chars += 1;
        if is_suspicious(ch) {
            suspicious_chars += 1;
        }
    }
    TextAnalysis {
        total_chars,
        suspicious_chars,
    }
}

fn is_suspicious(ch: char) -> bool {
    matches!(ch, '\0'..='\u{1F}' if !matches!(ch, '\t' | '\n' | '\r')) || ch == '\u{FFFD}'
}

/// Classify a frame according to the shape the transport delivered it in.
pub fn classify_frame(frame: &InterceptedFrame) -> ClassifiedMessage {
    match frame.raw_kind {
        RawKind::Text => match std::str::from_utf8(&frame.raw_bytes) {
            Ok(text) => classify_string(text, &frame.raw_preview),
            Err(_) => classify_binary(&frame.raw_bytes, &frame.raw_preview),
        },
        RawKind::ArrayBuffer | RawKind::Blob => {
            classify_binary(&frame.raw_bytes, &frame.raw_preview)
        }
    }
}

/// Classify a string frame. Strings shaped like base64 are decoded first,
/// since the monitored protocol ships JSON as base64 text.
pub fn classify_text(text: &str) -> ClassifiedMessage {
    classify_string(text, "")
}

pub fn classify_bytes(bytes: &[u8]) -> ClassifiedMessage {
    classify_binary(bytes, "")
}

struct Candidate {
    bytes: Vec<u8>,
    base64: String,
    known_text: Option<String>,
}

fn classify_string(text: &str, fallback_preview: &str) -> ClassifiedMessage {
    if looks_like_base64(text) {
        if let Some(bytes) = base64_to_bytes(text) {
            return finish(
                Candidate {
                    bytes,
                    base64: text.to_owned(),
                    known_text: None,
                },
                fallback_preview,
            );
        }
        monitor_debug!("Base64-shaped string frame did not decode; treating it as text");
    }
    finish(
        Candidate {
            bytes: text.as_bytes().to_vec(),
            base64: string_to_base64(text),
            known_text: Some(text.to_owned()),
        },
        fallback_preview,
    )
}

fn classify_binary(bytes: &[u8], fallback_preview: &str) -> ClassifiedMessage {
    finish(
        Candidate {
            bytes: bytes.to_vec(),
            base64: bytes_to_base64(bytes),
            known_text: None,
        },
        fallback_preview,
    )
}

fn finish(candidate: Candidate, fallback_preview: &str) -> ClassifiedMessage {
    let Candidate {
        bytes,
        base64,
        known_text,
    } = candidate;

    let hex_preview = bytes_to_hex_preview(&bytes, HEX_PREVIEW_MAX);
    let candidate_text = match known_text {
        Some(text) => Some(text),
        None if bytes.is_empty() => None,
        None => Some(decode_utf8_lossy(&bytes)),
    };

    let is_text = candidate_text
        .as_deref()
        .is_some_and(|text| analyze_text(text).is_text());

    let preview_source = candidate_text
        .as_deref()
        .filter(|text| !text.is_empty())
        .unwrap_or(fallback_preview);
    let text_preview = sanitize_preview(preview_source, TEXT_PREVIEW_MAX);

    let decoded_text = if is_text { candidate_text } else { None };
    let parsed_json = decoded_text.as_deref().and_then(parse_json);

    if !is_text {
        monitor_trace!("Frame classified as binary: {}", hex_preview);
    }

    ClassifiedMessage {
        is_text,
        decoded_text,
        base64,
        hex_preview,
        text_preview,
        parsed_json,
    }
}

fn parse_json(text: &str) -> Option<serde_json::Value> {
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(_) => {
            monitor_trace!("Decoded message is not valid JSON");
            None
        }
    }
}
