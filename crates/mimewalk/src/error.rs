//! Error types for MIME traversal and decoding.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
///
/// Structural errors ([`Error::MalformedMediaType`], [`Error::MissingBoundary`],
/// [`Error::MalformedMultipart`], [`Error::NestingTooDeep`]) abort a traversal.
/// Content errors ([`Error::UnsupportedCharset`],
/// [`Error::UnsupportedTransferEncoding`], [`Error::Base64Decode`],
/// [`Error::InvalidEncodedWord`]) are recovered by the decoding layer and only
/// surface from the lower-level functions that report them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `Content-Type` (or `Content-Disposition`) could not be parsed.
    #[error("Malformed media type: {0}")]
    MalformedMediaType(String),

    /// Missing boundary in multipart message.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// Boundary delimiters are missing or corrupt.
    #[error("Malformed multipart framing: {0}")]
    MalformedMultipart(String),

    /// Container nesting exceeds the configured limit.
    #[error("Multipart nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    /// Charset name could not be resolved to a decoder.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// Unknown `Content-Transfer-Encoding` value.
    #[error("Unsupported Content-Transfer-Encoding: {0}")]
    UnsupportedTransferEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// RFC 2047 encoded-word could not be decoded.
    #[error("Invalid encoded-word: {0}")]
    InvalidEncodedWord(String),

    /// A visitor callback aborted the traversal.
    #[error("Visitor aborted traversal: {0}")]
    Visitor(String),

    /// I/O error while reading a message.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the error describes the shape of the MIME tree.
    ///
    /// Structural errors are fatal for a traversal; everything else is a
    /// content error that decoding recovers from.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MalformedMediaType(_)
                | Self::MissingBoundary
                | Self::MalformedMultipart(_)
                | Self::NestingTooDeep(_)
        )
    }
}
