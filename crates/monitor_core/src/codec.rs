use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use encoding_rs::UTF_8;
use monitor_logging::monitor_warn;

/// Input bytes per encoding pass. A multiple of 3 keeps every segment
/// padding-free so segments concatenate into one valid encoding.
const CHUNK_BYTES: usize = (32 * 1024 / 3) * 3;

pub const TEXT_PREVIEW_MAX: usize = 200;
pub const HEX_PREVIEW_MAX: usize = 32;

/// Browser-compatible (`atob`) decoder: padding is optional and non-zero
/// trailing bits in the final quantum are dropped.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const TEXT_TRUNCATED_MARKER: &str = "...";
const HEX_TRUNCATED_MARKER: &str = " ...";

/// Encode bytes as standard padded base64, processing the input in fixed-size chunks.
pub fn bytes_to_base64(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(CHUNK_BYTES) {
        STANDARD.encode_string(chunk, &mut encoded);
    }
    encoded
}

/// Decode base64 the way browsers do. Malformed input yields `None`.
pub fn base64_to_bytes(base64: &str) -> Option<Vec<u8>> {
    match FORGIVING.decode(base64) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            monitor_warn!(
                "Failed to decode base64 payload ({} chars): {}",
                base64.len(),
                err
            );
            None
        }
    }
}

pub fn string_to_base64(text: &str) -> String {
    bytes_to_base64(text.as_bytes())
}

/// Cheap shape check used to pick how an ambiguous string frame is read.
pub fn looks_like_base64(text: &str) -> bool {
    if text.is_empty() || text.len() % 4 != 0 {
        return false;
    }
    let body = text.trim_end_matches('=');
    if text.len() - body.len() > 2 || body.is_empty() {
        return false;
    }
    body.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

/// Non-fatal UTF-8 decode: strips a leading BOM and maps malformed sequences to U+FFFD.
pub fn decode_utf8_lossy(bytes: &[u8]) -> String {
    let (text, _had_errors) = UTF_8.decode_with_bom_removal(bytes);
    text.into_owned()
}

/// Truncate to `max_len` characters and escape control characters so the
/// result is safe inside JSON bodies and single-line log records.
pub fn sanitize_preview(text: &str, max_len: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_len).collect();
    let truncated = chars.next().is_some();

    let mut preview = String::with_capacity(head.len() + TEXT_TRUNCATED_MARKER.len());
    for ch in head.chars() {
        match ch {
            '\r' => preview.push_str("\\r"),
            '\n' => preview.push_str("\\n"),
            '\t' => preview.push_str("\\t"),
            '\0'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' => preview.push('?'),
            other => preview.push(other),
        }
    }
    if truncated {
        preview.push_str(TEXT_TRUNCATED_MARKER);
    }
    preview
}

/// Space-separated lowercase hex pairs of at most `max_len` bytes.
pub fn bytes_to_hex_preview(bytes: &[u8], max_len: usize) -> String {
    let shown = &bytes[..bytes.len().min(max_len)];
    let mut preview = shown
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    if bytes.len() > max_len {
        preview.push_str(HEX_TRUNCATED_MARKER);
    }
    preview
}
