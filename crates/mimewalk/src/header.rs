//! MIME header handling.

use crate::encoding::decode_header;
use std::fmt;

/// Collection of header fields.
///
/// Field order is preserved as first seen; names are matched
/// case-insensitively and each name may carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|(field, _)| field.eq_ignore_ascii_case(name))
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.fields[idx].1.push(value),
            None => self.fields.push((name, vec![value])),
        }
    }

    /// Sets a header value, replacing any existing values.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.fields[idx].1 = vec![value],
            None => self.fields.push((name, vec![value])),
        }
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|idx| self.fields[idx].1.first().map(String::as_str))
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.position(name)
            .map(|idx| self.fields[idx].1.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|(field, _)| !field.eq_ignore_ascii_case(name));
    }

    /// Number of distinct field names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns an iterator over all fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Parses headers from raw text.
    ///
    /// Headers are in the format:
    /// ```text
    /// Header-Name: value
    /// Continuation: line
    ///   folded onto the previous field
    /// ```
    ///
    /// Parsing stops at the first empty line. Lines without a colon are
    /// skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current_name: Option<String> = None;
        let mut current_value = String::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            // Continuation line (starts with space or tab)
            if line.starts_with(' ') || line.starts_with('\t') {
                if current_name.is_some() {
                    let folded = line.trim();
                    if !folded.is_empty() {
                        if !current_value.is_empty() {
                            current_value.push(' ');
                        }
                        current_value.push_str(folded);
                    }
                }
                continue;
            }

            if let Some(name) = current_name.take() {
                headers.add(name, current_value.trim().to_string());
                current_value.clear();
            }

            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim();
                if !name.is_empty() {
                    current_name = Some(name.to_string());
                    current_value = value.trim().to_string();
                }
            }
        }

        if let Some(name) = current_name {
            headers.add(name, current_value.trim().to_string());
        }

        headers
    }

    /// Parses a header block given as raw bytes.
    ///
    /// Bytes that are not valid UTF-8 are replaced; encoded words are left
    /// for [`Headers::decode_value`].
    #[must_use]
    pub fn parse_bytes(raw: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(raw))
    }

    /// Decodes a header value from RFC 2047 if encoded.
    ///
    /// Never fails: undecodable input is returned unchanged.
    #[must_use]
    pub fn decode_value(value: &str) -> String {
        decode_header(value)
    }

    /// Gets the first value for a header with encoded-words decoded.
    #[must_use]
    pub fn get_decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(decode_header)
    }
}

/// Canonical header name (e.g., "content-type" -> "Content-Type").
#[must_use]
pub fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

impl fmt::Display for Headers {
    /// Writes `Name: value` lines terminated by CRLF, sorted by canonical name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<_> = self
            .fields
            .iter()
            .map(|(name, values)| (canonical_name(name), values))
            .collect();
        sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (name, values) in sorted {
            for value in values {
                let value = value.replace(['\r', '\n'], " ");
                write!(f, "{name}: {}\r\n", value.trim())?;
            }
        }

        Ok(())
    }
}

/// Serializes as a sequence of `[name, value]` pairs in field order.
#[cfg(feature = "serde")]
impl serde::Serialize for Headers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(None)?;
        for (name, value) in self.iter() {
            seq.serialize_element(&(canonical_name(name), value))?;
        }
        seq.end()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect
)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_headers_set() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("to", "bob@example.com");
        assert_eq!(headers.get_all("To").len(), 2);

        headers.set("To", "charlie@example.com");
        assert_eq!(headers.get_all("To").len(), 1);
        assert_eq!(headers.get("To"), Some("charlie@example.com"));
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        assert!(headers.get("Subject").is_some());

        headers.remove("subject");
        assert!(headers.get("Subject").is_none());
    }

    #[test]
    fn test_headers_preserve_order() {
        let mut headers = Headers::new();
        headers.add("X-Second", "2");
        headers.add("A-First", "1");
        headers.add("x-second", "3");

        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["X-Second", "X-Second", "A-First"]);
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "Not-A-Header: body\r\n"
        );

        let headers = Headers::parse(text);
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("To"), Some("recipient@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert!(headers.get("Not-A-Header").is_none());
    }

    #[test]
    fn test_headers_parse_folded_tab() {
        let text = "Content-Type: multipart/mixed;\n\tboundary=\"XXXXboundary text\"\n";
        let headers = Headers::parse(text);
        assert_eq!(
            headers.get("content-type"),
            Some("multipart/mixed; boundary=\"XXXXboundary text\"")
        );
    }

    #[test]
    fn test_headers_display_canonical_sorted() {
        let mut headers = Headers::new();
        headers.add("to", "recipient@example.com");
        headers.add("content-TYPE", "text/plain");
        headers.add("from", "sender@example.com");

        let s = headers.to_string();
        assert_eq!(
            s,
            "Content-Type: text/plain\r\nFrom: sender@example.com\r\nTo: recipient@example.com\r\n"
        );
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("content-transfer-encoding"), "Content-Transfer-Encoding");
        assert_eq!(canonical_name("MIME-VERSION"), "Mime-Version");
    }

    #[test]
    fn test_get_decoded() {
        let mut headers = Headers::new();
        headers.add("Subject", "=?utf-8?B?SMOpbGxv?=");
        assert_eq!(headers.get_decoded("subject").as_deref(), Some("Héllo"));
    }
}
