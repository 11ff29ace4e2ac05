//! Charset resolution and decoding to UTF-8.
//!
//! Names are resolved through a static alias table covering IANA/MIME
//! aliases the WHATWG label set lacks, then through
//! [`encoding_rs::Encoding::for_label`]. UTF-7 is handled by [`utf7`].

mod utf7;

pub use utf7::decode_utf7;

use crate::error::{Error, Result};
use encoding_rs::Encoding;
use std::collections::HashMap;
use std::sync::LazyLock;

/// A resolved character set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// An encoding from the WHATWG set.
    Encoding(&'static Encoding),
    /// RFC 2152 UTF-7.
    Utf7,
}

impl Charset {
    /// Canonical name of the charset.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Encoding(encoding) => encoding.name(),
            Self::Utf7 => "UTF-7",
        }
    }

    /// Returns true if decoding is the identity on valid input.
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        matches!(self, Self::Encoding(encoding) if *encoding == encoding_rs::UTF_8)
    }

    /// Decodes bytes in this charset to a string.
    ///
    /// Malformed sequences become U+FFFD.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Encoding(encoding) => encoding
                .decode_without_bom_handling(bytes)
                .0
                .into_owned(),
            Self::Utf7 => decode_utf7(bytes),
        }
    }
}

/// Aliases not known to the WHATWG label table, mapped to a label it knows.
const ALIASES: &[(&str, &str)] = &[
    // UTF-8
    ("csutf8", "utf-8"),
    ("iso-utf-8", "utf-8"),
    ("utf8mb4", "utf-8"),
    ("utf8mb3", "utf-8"),
    // US-ASCII is taken as UTF-8, 8-bit content under it is usually UTF-8
    ("us-ascii", "utf-8"),
    ("ascii", "utf-8"),
    ("iso-ir-6", "utf-8"),
    ("ansi_x3.4-1968", "utf-8"),
    ("ansi_x3.4-1986", "utf-8"),
    ("ansi_x3.110-1983", "utf-8"),
    ("iso_646.irv:1991", "utf-8"),
    ("iso646-us", "utf-8"),
    ("us", "utf-8"),
    ("ibm367", "utf-8"),
    ("cp367", "utf-8"),
    ("csascii", "utf-8"),
    // Latin-1 (WHATWG decodes it as windows-1252)
    ("cp850", "windows-1252"),
    ("cp858", "windows-1252"),
    ("we8iso8859p1", "windows-1252"),
    ("cswindows1252", "windows-1252"),
    ("3dwindows-1252", "windows-1252"),
    ("we8mswin1252", "windows-1252"),
    // ISO-8859-x
    ("ibm852", "iso-8859-2"),
    ("iso_8859-10:1992", "iso-8859-10"),
    ("csiso885913", "iso-8859-13"),
    ("iso-ir-199", "iso-8859-14"),
    ("iso_8859-14:1998", "iso-8859-14"),
    ("iso_8859-14", "iso-8859-14"),
    ("latin8", "iso-8859-14"),
    ("iso-celtic", "iso-8859-14"),
    ("l8", "iso-8859-14"),
    ("csiso885914", "iso-8859-14"),
    ("latin-9", "iso-8859-15"),
    ("csiso885915", "iso-8859-15"),
    // Windows code pages
    ("cswindows874", "windows-874"),
    ("cp874", "windows-874"),
    ("cswindows1250", "windows-1250"),
    ("cswindows1251", "windows-1251"),
    ("cswindows1253", "windows-1253"),
    ("cswindows1254", "windows-1254"),
    ("cswindows1255", "windows-1255"),
    ("cswindows1256", "windows-1256"),
    ("cswindows1257", "windows-1257"),
    ("cswindows1258", "windows-1258"),
    // Cyrillic and Mac
    ("koi8r", "koi8-r"),
    ("cskoi8u", "koi8-u"),
    ("koi8u", "koi8-u"),
    ("macroman", "macintosh"),
    // CJK
    ("euccn", "gbk"),
    ("ibm-euccn", "gbk"),
    ("zht16mswin950", "big5"),
    ("cp950", "big5"),
    ("euckr", "euc-kr"),
    ("ibm-euckr", "euc-kr"),
    ("cp949", "euc-kr"),
    ("eucjp", "euc-jp"),
    ("ibm-eucjp", "euc-jp"),
    ("iso2022jp", "iso-2022-jp"),
    ("shift-jis", "shift_jis"),
    ("cp932", "shift_jis"),
];

const UTF7_NAMES: &[&str] = &["utf-7", "utf7", "unicode-1-1-utf-7", "csunicode11utf7"];

static TABLE: LazyLock<HashMap<&'static str, Charset>> = LazyLock::new(|| {
    let mut table = HashMap::with_capacity(ALIASES.len() + UTF7_NAMES.len());
    for (alias, label) in ALIASES {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            table.insert(*alias, Charset::Encoding(encoding));
        }
    }
    for name in UTF7_NAMES {
        table.insert(*name, Charset::Utf7);
    }
    table
});

/// Resolves a charset name (case-insensitive, any known alias).
///
/// # Errors
///
/// Returns [`Error::UnsupportedCharset`] if the name is unknown or maps to
/// the WHATWG replacement encoding.
pub fn resolve_charset(name: &str) -> Result<Charset> {
    let normalized = name.trim().trim_matches('"').to_ascii_lowercase();

    if let Some(charset) = TABLE.get(normalized.as_str()) {
        return Ok(*charset);
    }

    match Encoding::for_label(normalized.as_bytes()) {
        Some(encoding) if encoding != encoding_rs::REPLACEMENT => Ok(Charset::Encoding(encoding)),
        _ => Err(Error::UnsupportedCharset(name.to_string())),
    }
}

/// Decodes bytes in the named charset to UTF-8.
///
/// `None`, an empty name or a name resolving to UTF-8 (US-ASCII included)
/// means the bytes are already UTF-8; they are returned as-is. Empty input is returned unchanged without resolving the
/// charset. Leading and trailing NUL padding is stripped from decoded output.
///
/// # Errors
///
/// Returns [`Error::UnsupportedCharset`] if the charset cannot be resolved.
pub fn decode_charset(bytes: &[u8], charset: Option<&str>) -> Result<Vec<u8>> {
    let Some(name) = charset.map(str::trim).filter(|name| !name.is_empty()) else {
        return Ok(bytes.to_vec());
    };
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let charset = resolve_charset(name)?;
    if charset.is_utf8() {
        return Ok(bytes.to_vec());
    }
    let decoded = charset.decode(bytes);
    Ok(decoded.trim_matches('\0').as_bytes().to_vec())
}
