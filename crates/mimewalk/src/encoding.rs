//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header decoding. Every
//! decoder here is lenient: mail in the wild rarely follows the RFCs to the
//! letter.

use crate::charset;
use crate::error::{Error, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use std::borrow::Cow;
use std::fmt;

/// Base64 engine accepting missing padding and non-zero trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    ///
    /// An empty value means the default, 7bit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedTransferEncoding`] for unknown names.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "7bit" => Ok(Self::SevenBit),
            "8bit" => Ok(Self::EightBit),
            "base64" => Ok(Self::Base64),
            "quoted-printable" => Ok(Self::QuotedPrintable),
            "binary" => Ok(Self::Binary),
            _ => Err(Error::UnsupportedTransferEncoding(s.to_string())),
        }
    }

    /// Returns true if decoding is the identity.
    #[must_use]
    pub const fn is_identity(self) -> bool {
        matches!(self, Self::SevenBit | Self::EightBit | Self::Binary)
    }

    /// Decodes data in this encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Base64Decode`] if base64 input is corrupt.
    pub fn decode(self, data: &[u8]) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Base64 => decode_base64(data).map(Cow::Owned),
            Self::QuotedPrintable => Ok(Cow::Owned(decode_quoted_printable(data))),
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(Cow::Borrowed(data)),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Reverses a `Content-Transfer-Encoding`.
///
/// Unknown encodings and corrupt base64 degrade to the input bytes; both
/// are logged. `None` means the header was absent.
#[must_use]
pub fn decode_transfer_encoding<'a>(data: &'a [u8], encoding: Option<&str>) -> Cow<'a, [u8]> {
    let encoding = match TransferEncoding::parse(encoding.unwrap_or_default()) {
        Ok(encoding) => encoding,
        Err(e) => {
            tracing::warn!(?e, "Treating part as unencoded");
            return Cow::Borrowed(data);
        }
    };
    if encoding.is_identity() {
        return Cow::Borrowed(data);
    }

    match encoding.decode(data) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(?e, %encoding, "Transfer decoding failed, keeping raw bytes");
            Cow::Borrowed(data)
        }
    }
}

/// Decodes Base64 data, ignoring whitespace and missing padding.
///
/// # Errors
///
/// Returns an error if the input contains characters outside the alphabet.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT.decode(cleaned).map_err(Into::into)
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decodes Quoted-Printable data (RFC 2045 6.7).
///
/// Trailing whitespace on each line is dropped, `=` at the end of a line is a
/// soft line break, and invalid escapes are kept literally. Hard line
/// breaks keep their original form.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());

    for line in data.split_inclusive(|&b| b == b'\n') {
        let (content, newline): (&[u8], &[u8]) = if let Some(stripped) = line.strip_suffix(b"\r\n")
        {
            (stripped, b"\r\n")
        } else if let Some(stripped) = line.strip_suffix(b"\n") {
            (stripped, b"\n")
        } else {
            (line, b"")
        };

        let content = content.trim_ascii_end();
        let (content, soft_break) = match content.strip_suffix(b"=") {
            Some(stripped) => (stripped, true),
            None => (content, false),
        };

        let mut i = 0;
        while i < content.len() {
            let byte = content[i];
            if byte == b'=' {
                let hi = content.get(i + 1).copied().and_then(hex_value);
                let lo = content.get(i + 2).copied().and_then(hex_value);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    result.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
            result.push(byte);
            i += 1;
        }

        if !soft_break {
            result.extend_from_slice(newline);
        }
    }

    result
}

/// Decodes an RFC 2047 header value, returning the input on failure.
///
/// Failures are logged; the display value of a header never aborts a
/// traversal.
#[must_use]
pub fn decode_header(raw: &str) -> String {
    match try_decode_header(raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(?e, raw, "Header decoding failed");
            raw.to_string()
        }
    }
}

/// Decodes every RFC 2047 encoded-word in a header value.
///
/// Format: `=?charset?encoding?encoded-text?=`
///
/// Whitespace between adjacent encoded-words is removed. Text that merely
/// looks like an encoded-word but names neither B nor Q is kept as-is.
///
/// # Errors
///
/// Returns [`Error::UnsupportedCharset`] if an encoded-word names an unknown
/// charset and [`Error::InvalidEncodedWord`] if a B or Q payload is corrupt.
pub fn try_decode_header(raw: &str) -> Result<String> {
    let Some(first) = raw.find("=?") else {
        return Ok(raw.to_string());
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..first]);
    let mut rest = &raw[first..];
    let mut between_words = false;

    while let Some(word) = EncodedWord::find(rest) {
        let Some(content) = word.decode_content()? else {
            between_words = false;
            out.push_str(&rest[..word.start + 2]);
            rest = &rest[word.start + 2..];
            continue;
        };

        let before = &rest[..word.start];
        if !between_words || before.contains(|c: char| !c.is_ascii_whitespace()) {
            out.push_str(before);
        }

        let bytes = charset::decode_charset(&content, Some(word.charset))?;
        out.push_str(&String::from_utf8_lossy(&bytes));

        rest = &rest[word.end..];
        between_words = true;
    }

    out.push_str(rest);
    Ok(out)
}

/// Location of one `=?charset?X?text?=` candidate inside a header value.
struct EncodedWord<'a> {
    start: usize,
    end: usize,
    charset: &'a str,
    encoding: u8,
    text: &'a str,
}

impl<'a> EncodedWord<'a> {
    fn find(s: &'a str) -> Option<Self> {
        let start = s.find("=?")?;
        let mut cur = start + 2;

        let charset_len = s[cur..].find('?')?;
        let charset = &s[cur..cur + charset_len];
        cur += charset_len + 1;

        let bytes = s.as_bytes();
        if bytes.len() < cur + 4 {
            return None;
        }
        let encoding = bytes[cur];
        if bytes[cur + 1] != b'?' {
            return None;
        }
        cur += 2;

        let text_len = s[cur..].find("?=")?;
        let text = &s[cur..cur + text_len];

        // RFC 2231 language suffix: charset*lang
        let charset = charset.split_once('*').map_or(charset, |(cs, _)| cs);

        Some(Self {
            start,
            end: cur + text_len + 2,
            charset,
            encoding,
            text,
        })
    }

    /// `None` if the encoding letter is neither B nor Q.
    fn decode_content(&self) -> Result<Option<Vec<u8>>> {
        let decoded = match self.encoding {
            b'B' | b'b' => LENIENT.decode(self.text).ok(),
            b'Q' | b'q' => decode_q(self.text),
            _ => return Ok(None),
        };
        decoded
            .map(Some)
            .ok_or_else(|| Error::InvalidEncodedWord(format!("{}?{}", self.charset, self.text)))
    }
}

/// Decodes the RFC 2047 "Q" encoding.
fn decode_q(text: &str) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' => {
                let hi = hex_value(*bytes.get(i + 1)?)?;
                let lo = hex_value(*bytes.get(i + 2)?)?;
                out.push((hi << 4) | lo);
                i += 2;
            }
            b @ (b' '..=b'~' | b'\n' | b'\r' | b'\t') => out.push(b),
            _ => return None,
        }
        i += 1;
    }
    Some(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::unreadable_literal)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit").unwrap(), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("").unwrap(), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64").unwrap(), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse(" Quoted-Printable ").unwrap(),
            TransferEncoding::QuotedPrintable
        );
        assert!(matches!(
            TransferEncoding::parse("x-uuencode"),
            Err(Error::UnsupportedTransferEncoding(_))
        ));
    }

    #[test]
    fn test_decode_transfer_encoding_unknown_is_identity() {
        let data = b"begin 644 file\n";
        assert_eq!(decode_transfer_encoding(data, Some("x-uuencode")).as_ref(), data);
        assert_eq!(decode_transfer_encoding(data, None).as_ref(), data);
    }

    #[test]
    fn test_decode_transfer_encoding_base64() {
        let decoded = decode_transfer_encoding(b"SGVsbG8s\r\nIFdvcmxkIQ==\r\n", Some("base64"));
        assert_eq!(decoded.as_ref(), b"Hello, World!");
    }

    #[test]
    fn test_decode_transfer_encoding_corrupt_base64_keeps_raw() {
        let data = b"not*base64*at*all";
        assert_eq!(decode_transfer_encoding(data, Some("base64")).as_ref(), data);
    }

    #[test]
    fn test_base64_missing_padding() {
        assert_eq!(decode_base64(b"SGk").unwrap(), b"Hi");
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"Hello, World!"), b"Hello, World!");
        assert_eq!(decode_quoted_printable(b"H=C3=A9llo"), "Héllo".as_bytes());
        assert_eq!(decode_quoted_printable(b"h=c3=a9llo"), "héllo".as_bytes());
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello= \nWorld\n"), b"HelloWorld\n");
    }

    #[test]
    fn test_quoted_printable_trailing_whitespace_and_newlines() {
        assert_eq!(
            decode_quoted_printable(b"line one   \r\nline two\t\r\n"),
            b"line one\r\nline two\r\n"
        );
    }

    #[test]
    fn test_quoted_printable_invalid_escape_is_literal() {
        assert_eq!(decode_quoted_printable(b"a=ZZb=4"), b"a=ZZb=4");
        assert_eq!(
            decode_quoted_printable(b"<body text=3D\"#000000\">"),
            b"<body text=\"#000000\">"
        );
    }

    #[test]
    fn test_decode_header_plain() {
        assert_eq!(decode_header(""), "");
        assert_eq!(decode_header("Hello"), "Hello");
    }

    #[test]
    fn test_decode_header_base64() {
        assert_eq!(decode_header("=?utf-8?B?SMOpbGxv?="), "Héllo");
        assert_eq!(
            decode_header("=?UTF-8?B?w4TDi8OPw5bDnA==?= =?UTF-8?B?IMOkw6vDr8O2w7w=?="),
            "ÄËÏÖÜ äëïöü"
        );
    }

    #[test]
    fn test_decode_header_quoted_printable() {
        assert_eq!(decode_header("=?utf-8?Q?H=C3=A9llo_there?="), "Héllo there");
    }

    #[test]
    fn test_decode_header_iso_8859_2() {
        assert_eq!(
            decode_header("=?ISO-8859-2?B?xMtJ1tw=?= =?ISO-8859-2?B?IOTrafb8?="),
            "ÄËIÖÜ äëiöü"
        );
    }

    #[test]
    fn test_decode_header_iso_2022_jp() {
        assert_eq!(
            decode_header("=?iso-2022-jp?Q?=1B$B!Z=1B(BTimes_Car_PLUS=1B$B![JV5Q>Z=1B(B?="),
            "【Times Car PLUS】返却証"
        );
        assert_eq!(
            decode_header("=?iso-2022-jp?Q?iTunes_Movie_=1B$B%K%e!<%j%j!<%9$HCmL\\:nIJ=1B(B?="),
            "iTunes Movie ニューリリースと注目作品"
        );
    }

    #[test]
    fn test_decode_header_keeps_surrounding_text() {
        assert_eq!(
            decode_header("Re: =?utf-8?Q?caf=C3=A9?= tonight"),
            "Re: café tonight"
        );
    }

    #[test]
    fn test_decode_header_unknown_charset_returns_raw() {
        let raw = "=?uknown?B?xMtJ1tw=?= =?ISO-8859-2?B?IOTrafb8?=";
        assert_eq!(decode_header(raw), raw);
        assert!(try_decode_header(raw).is_err());
    }

    #[test]
    fn test_decode_header_corrupt_payload() {
        let raw = "Re: =?utf-8?B?SMOp*bGxv?=";
        assert!(matches!(
            try_decode_header(raw),
            Err(Error::InvalidEncodedWord(word)) if word == "utf-8?SMOp*bGxv"
        ));
        assert_eq!(decode_header(raw), raw);
        assert!(matches!(
            try_decode_header("=?utf-8?Q?caf=C?="),
            Err(Error::InvalidEncodedWord(_))
        ));
    }

    #[test]
    fn test_transfer_encoding_is_identity() {
        assert!(TransferEncoding::SevenBit.is_identity());
        assert!(TransferEncoding::Binary.is_identity());
        assert!(!TransferEncoding::Base64.is_identity());
        assert!(!TransferEncoding::QuotedPrintable.is_identity());
    }

    #[test]
    fn test_decode_header_malformed_word_kept() {
        assert_eq!(decode_header("=?utf-8?X?abc?= tail"), "=?utf-8?X?abc?= tail");
        assert_eq!(decode_header("50% =? off"), "50% =? off");
    }
}
