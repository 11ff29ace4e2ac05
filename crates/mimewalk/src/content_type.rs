//! MIME content type and disposition handling.

use crate::charset;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a text/html content type.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// Content type of a part that carries no `Content-Type` field (RFC 2045 5.2).
    #[must_use]
    pub fn implicit() -> Self {
        Self::new("text", "plain").with_parameter("charset", "us-ascii")
    }

    /// Creates a `multipart/<sub_type>` content type with boundary.
    #[must_use]
    pub fn multipart(sub_type: impl Into<String>, boundary: impl Into<String>) -> Self {
        Self::new("multipart", sub_type).with_parameter("boundary", boundary)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns `type/subtype` in lower case.
    #[must_use]
    pub fn media_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks the exact media type, e.g. `is("text", "plain")`.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main_type) && self.sub_type.eq_ignore_ascii_case(sub_type)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Returns the `name` parameter if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameters.get("name").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedMediaType`] if the type or subtype is missing
    /// or is not a valid token. Malformed parameters are skipped.
    pub fn parse(s: &str) -> Result<Self> {
        let (type_str, params) = s.split_once(';').unwrap_or((s, ""));

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::MalformedMediaType(format!("missing subtype in {s:?}")))?;

        let main_type = main_type.trim();
        let sub_type = sub_type.trim();
        if !is_token(main_type) || !is_token(sub_type) {
            return Err(Error::MalformedMediaType(format!("invalid media type {s:?}")));
        }

        Ok(Self {
            main_type: main_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
            parameters: parse_parameters(params),
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;
        write_parameters(f, &self.parameters)
    }
}

/// `Content-Disposition` field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type (e.g., "inline", "attachment"), lower case.
    pub disposition: String,
    /// Parameters (e.g., filename=report.pdf).
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses a disposition field value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedMediaType`] if the disposition type is not a
    /// valid token.
    pub fn parse(s: &str) -> Result<Self> {
        let (kind, params) = s.split_once(';').unwrap_or((s, ""));
        let kind = kind.trim();
        if !is_token(kind) {
            return Err(Error::MalformedMediaType(format!("invalid disposition {s:?}")));
        }

        Ok(Self {
            disposition: kind.to_ascii_lowercase(),
            parameters: parse_parameters(params),
        })
    }

    /// Checks if the disposition is `attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition == "attachment"
    }

    /// Returns the filename parameter if present.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters.get("filename").map(String::as_str)
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.disposition)?;
        write_parameters(f, &self.parameters)
    }
}

fn write_parameters(f: &mut fmt::Formatter<'_>, parameters: &HashMap<String, String>) -> fmt::Result {
    let sorted: BTreeMap<_, _> = parameters.iter().collect();
    for (key, value) in sorted {
        // Quote value if it contains special characters
        if value.is_empty() || !is_token(value) {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            write!(f, "; {key}=\"{escaped}\"")?;
        } else {
            write!(f, "; {key}={value}")?;
        }
    }
    Ok(())
}

/// RFC 2045 token: printable ASCII without space or tspecials.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b))
}

/// Parses `; key=value` pairs, including RFC 2231 continuations and
/// extended (`charset'lang'%XX`) values.
fn parse_parameters(input: &str) -> HashMap<String, String> {
    let mut simple = HashMap::new();
    // base name -> (section key -> raw value)
    let mut sections: HashMap<String, BTreeMap<String, String>> = HashMap::new();

    for (key, value) in ParamIter::new(input) {
        match key.split_once('*') {
            Some((base, section)) => {
                sections
                    .entry(base.to_string())
                    .or_default()
                    .insert(section.to_string(), value);
            }
            None => {
                simple.insert(key, value);
            }
        }
    }

    for (base, pieces) in sections {
        // `name*=charset'lang'value`
        if let Some(value) = pieces.get("") {
            if let Some(decoded) = decode_extended(value) {
                simple.insert(base, decoded);
            }
            continue;
        }

        let mut assembled = Vec::new();
        let mut charset_name: Option<String> = None;
        for n in 0usize.. {
            if let Some(raw) = pieces.get(&format!("{n}*")) {
                let bytes = if n == 0 {
                    let Some((cs, encoded)) = split_extended(raw) else { break };
                    charset_name = Some(cs.to_string());
                    percent_decode(encoded)
                } else {
                    percent_decode(raw)
                };
                assembled.extend_from_slice(&bytes);
            } else if let Some(raw) = pieces.get(&n.to_string()) {
                assembled.extend_from_slice(raw.as_bytes());
            } else {
                break;
            }
        }

        if !assembled.is_empty() {
            simple.insert(base, bytes_to_string(&assembled, charset_name.as_deref()));
        }
    }

    simple
}

/// Splits `charset'lang'value` into charset and value.
fn split_extended(value: &str) -> Option<(&str, &str)> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    Some((charset, encoded))
}

fn decode_extended(value: &str) -> Option<String> {
    let (cs, encoded) = split_extended(value)?;
    Some(bytes_to_string(&percent_decode(encoded), Some(cs)))
}

fn bytes_to_string(bytes: &[u8], charset_name: Option<&str>) -> String {
    let name = charset_name.filter(|cs| !cs.is_empty());
    match charset::decode_charset(bytes, name) {
        Ok(decoded) => String::from_utf8_lossy(&decoded).into_owned(),
        Err(e) => {
            tracing::warn!(?e, "Undecodable parameter value");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(hi), Some(lo)) = (
                bytes.get(i + 1).and_then(|b| hex_value(*b)),
                bytes.get(i + 2).and_then(|b| hex_value(*b)),
            ) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Iterator over `key=value` pairs of a parameter list.
struct ParamIter<'a> {
    input: &'a str,
}

impl<'a> ParamIter<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input }
    }

    fn take_quoted(&mut self) -> String {
        let mut value = String::new();
        let mut chars = self.input.char_indices().skip(1);
        let mut end = self.input.len();
        while let Some((idx, ch)) = chars.next() {
            match ch {
                '"' => {
                    end = idx + 1;
                    break;
                }
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        value.push(escaped);
                    }
                }
                _ => value.push(ch),
            }
        }
        self.input = &self.input[end..];
        value
    }
}

impl Iterator for ParamIter<'_> {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.input = self.input.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
            if self.input.is_empty() {
                return None;
            }

            let key_end = self.input.find(['=', ';']).unwrap_or(self.input.len());
            let key = self.input[..key_end].trim().to_ascii_lowercase();
            self.input = &self.input[key_end..];

            if !self.input.starts_with('=') {
                // Parameter without value
                continue;
            }
            self.input = self.input[1..].trim_start();

            let value = if self.input.starts_with('"') {
                self.take_quoted()
            } else {
                let end = self.input.find(';').unwrap_or(self.input.len());
                let value = self.input[..end].trim().to_string();
                self.input = &self.input[end..];
                value
            };

            if !is_token(&key) {
                continue;
            }
            return Some((key, value));
        }
    }
}
