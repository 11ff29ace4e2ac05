//! Leaf text decoding: transfer encoding first, then charset.

use crate::charset::decode_charset;
use crate::config::Config;
use crate::content_type::ContentType;
use crate::encoding::decode_transfer_encoding;
use crate::header::Headers;

/// Decodes a leaf body to text with the default configuration.
#[must_use]
pub fn decode_text(body: &[u8], headers: &Headers) -> String {
    decode_text_with(body, headers, &Config::default())
}

/// Decodes a leaf body to text.
///
/// Unknown transfer encodings pass the bytes through. The `charset`
/// parameter of `Content-Type` (or [`Config::default_charset`]) selects the
/// charset; without one the bytes are taken as UTF-8. If the charset cannot
/// be resolved, [`Config::fallback_charset`] is tried, then the transfer
/// decoded bytes are used unchanged. Invalid UTF-8 in the result is replaced
/// with U+FFFD.
#[must_use]
pub fn decode_text_with(body: &[u8], headers: &Headers, config: &Config) -> String {
    let decoded = decode_transfer_encoding(body, headers.get("content-transfer-encoding"));

    // Only a declared parameter counts; the implicit us-ascii default does not.
    let content_type = headers
        .get("content-type")
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| ContentType::parse(value).ok());
    let charset = content_type
        .as_ref()
        .and_then(ContentType::charset)
        .or(config.default_charset.as_deref());

    let text = match decode_charset(&decoded, charset) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(?e, ?charset, "Decode charset error");
            config
                .fallback_charset
                .as_deref()
                .and_then(|fallback| decode_charset(&decoded, Some(fallback)).ok())
                .unwrap_or_else(|| decoded.into_owned())
        }
    };

    match String::from_utf8(text) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
