//! MIME message structure and handling.

use crate::address::fold_address_comments;
use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::{TransferEncoding, decode_transfer_encoding};
use crate::error::Result;
use crate::header::Headers;
use std::borrow::Cow;
use std::io::Read;

/// MIME message part.
///
/// The body holds the raw bytes between the part's header block and the
/// next boundary, before any transfer or charset decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw bytes).
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Parses a part from its raw bytes (header block, empty line, body).
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let (head, body) = split_header_body(raw);
        Self::new(Headers::parse_bytes(head), body.to_vec())
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Returns true if this part is not a `multipart/*` container.
    ///
    /// A malformed `Content-Type` counts as a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        is_leaf(&self.headers)
    }

    /// Gets the content disposition, if a valid one is present.
    #[must_use]
    pub fn disposition(&self) -> Option<ContentDisposition> {
        disposition_of(&self.headers)
    }

    /// Gets the transfer encoding, if a recognized one is declared.
    #[must_use]
    pub fn transfer_encoding(&self) -> Option<TransferEncoding> {
        self.headers
            .get("content-transfer-encoding")
            .and_then(|value| TransferEncoding::parse(value).ok())
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// Unknown encodings leave the body as-is.
    #[must_use]
    pub fn decode_body(&self) -> Cow<'_, [u8]> {
        decode_transfer_encoding(&self.body, self.headers.get("content-transfer-encoding"))
    }
}

/// Parses the `Content-Type` of a header block.
///
/// A missing field yields the RFC 2045 default, `text/plain; charset=us-ascii`.
///
/// # Errors
///
/// Returns [`crate::Error::MalformedMediaType`] if the field is present but
/// invalid.
pub fn content_type_of(headers: &Headers) -> Result<ContentType> {
    headers
        .get("content-type")
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| Ok(ContentType::implicit()), ContentType::parse)
}

/// Parses the `Content-Disposition` of a header block, ignoring invalid values.
#[must_use]
pub fn disposition_of(headers: &Headers) -> Option<ContentDisposition> {
    headers
        .get("content-disposition")
        .and_then(|value| ContentDisposition::parse(value).ok())
}

/// Returns true if the headers describe a non-`multipart/*` part.
#[must_use]
pub fn is_leaf(headers: &Headers) -> bool {
    content_type_of(headers).map_or(true, |ct| !ct.is_multipart())
}

/// Splits raw bytes at the first empty line into header block and body.
///
/// Input that starts with an empty line, or whose first line is not a
/// header field, has no headers. Input without an empty line is all headers.
#[must_use]
pub fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    let first_line = raw.split(|&b| b == b'\n').next().unwrap_or_default();
    let first_line = first_line.strip_suffix(b"\r").unwrap_or(first_line);
    if !first_line.is_empty() && !first_line.contains(&b':') {
        return (&[], raw);
    }

    let mut pos = 0;
    while pos < raw.len() {
        let rest = &raw[pos..];
        let line_end = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |idx| idx + 1);
        let line = &rest[..line_end];
        if line == b"\n" || line == b"\r\n" {
            return (&raw[..pos], &raw[pos + line_end..]);
        }
        pos += line_end;
    }
    (raw, &[])
}

/// MIME message: top-level headers and the undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Message body (raw bytes).
    pub body: Vec<u8>,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Parses a raw RFC 5322 message.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let (head, body) = split_header_body(raw);
        Self::new(Headers::parse_bytes(head), body.to_vec())
    }

    /// Reads and parses a message from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        Ok(Self::parse(&raw))
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Checks if this is a multipart message.
    ///
    /// # Errors
    ///
    /// Returns an error if content type cannot be determined.
    pub fn is_multipart(&self) -> Result<bool> {
        Ok(self.content_type()?.is_multipart())
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.get("to")
    }

    /// Decoded From header with address comments folded into display names.
    #[must_use]
    pub fn from_display(&self) -> Option<String> {
        self.headers
            .get_decoded("from")
            .map(|from| fold_address_comments(&from))
    }

    /// Decoded To header with address comments folded into display names.
    #[must_use]
    pub fn to_display(&self) -> Option<String> {
        self.headers
            .get_decoded("to")
            .map(|to| fold_address_comments(&to))
    }

    /// Gets the Subject header, with encoded-words decoded.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.headers.get_decoded("subject")
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.get("date")
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("message-id")
    }

    /// Converts the message into its root part.
    #[must_use]
    pub fn into_part(self) -> Part {
        Part::new(self.headers, self.body)
    }
}
