use std::fmt;

use serde::Serialize;

use crate::codec::{sanitize_preview, TEXT_PREVIEW_MAX};

/// Shape in which the transport delivered a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RawKind {
    Text,
    ArrayBuffer,
    Blob,
}

impl fmt::Display for RawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawKind::Text => write!(f, "Text"),
            RawKind::ArrayBuffer => write!(f, "ArrayBuffer"),
            RawKind::Blob => write!(f, "Blob"),
        }
    }
}

/// One observed message event, exactly as the transport delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedFrame {
    pub url: String,
    pub timestamp_utc: String,
    pub raw_kind: RawKind,
    pub raw_bytes: Vec<u8>,
    pub raw_preview: String,
}

impl InterceptedFrame {
    pub fn text(url: impl Into<String>, timestamp_utc: impl Into<String>, text: &str) -> Self {
        Self {
            url: url.into(),
            timestamp_utc: timestamp_utc.into(),
            raw_kind: RawKind::Text,
            raw_bytes: text.as_bytes().to_vec(),
            raw_preview: sanitize_preview(text, TEXT_PREVIEW_MAX),
        }
    }

    /// Binary frame; `raw_kind` must be `ArrayBuffer` or `Blob`.
    pub fn binary(
        url: impl Into<String>,
        timestamp_utc: impl Into<String>,
        raw_kind: RawKind,
        bytes: Vec<u8>,
    ) -> Self {
        let raw_preview = format!("[{raw_kind} {} bytes]", bytes.len());
        Self {
            url: url.into(),
            timestamp_utc: timestamp_utc.into(),
            raw_kind,
            raw_bytes: bytes,
            raw_preview,
        }
    }
}

/// Classifier output derived from an [`InterceptedFrame`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedMessage {
    pub is_text: bool,
    pub decoded_text: Option<String>,
    pub base64: String,
    pub hex_preview: String,
    pub text_preview: String,
    pub parsed_json: Option<serde_json::Value>,
}

impl ClassifiedMessage {
    /// Text the relevance scorer can work on. Binary frames fall back to
    /// their lossy preview when it still holds letters or digits; `None`
    /// means nothing readable was recovered.
    pub fn relevance_text(&self) -> Option<&str> {
        if self.is_text {
            return self.decoded_text.as_deref();
        }
        let preview = self.text_preview.as_str();
        let recovered = !self.base64.is_empty() && preview.chars().any(char::is_alphanumeric);
        recovered.then_some(preview)
    }

    /// True when neither bytes nor text were recovered from the frame.
    pub fn is_empty(&self) -> bool {
        self.base64.is_empty() && self.decoded_text.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_frames_describe_their_size() {
        let frame = InterceptedFrame::binary("wss://x", "t", RawKind::Blob, vec![1, 2, 3]);
        assert_eq!(frame.raw_preview, "[Blob 3 bytes]");
        let frame = InterceptedFrame::binary("wss://x", "t", RawKind::ArrayBuffer, Vec::new());
        assert_eq!(frame.raw_preview, "[ArrayBuffer 0 bytes]");
    }

    fn binary_message(base64: &str, text_preview: &str) -> ClassifiedMessage {
        ClassifiedMessage {
            is_text: false,
            decoded_text: None,
            base64: base64.to_string(),
            hex_preview: String::new(),
            text_preview: text_preview.to_string(),
            parsed_json: None,
        }
    }

    #[test]
    fn binary_relevance_text_needs_readable_preview() {
        assert_eq!(
            binary_message("CAESC2hlbGxv", "????hello").relevance_text(),
            Some("????hello")
        );
        assert_eq!(binary_message("AP8B/g==", "?\u{FFFD}?\u{FFFD}").relevance_text(), None);
        assert_eq!(binary_message("", "[Blob 0 bytes]").relevance_text(), None);
    }

    #[test]
    fn text_frames_keep_utf8_bytes_and_sanitized_preview() {
        let frame = InterceptedFrame::text("wss://x", "t", "a\nb");
        assert_eq!(frame.raw_bytes, b"a\nb");
        assert_eq!(frame.raw_preview, "a\\nb");
    }
}
