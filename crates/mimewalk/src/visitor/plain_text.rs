//! Plain-text collector.

use crate::config::Config;
use crate::decoder::decode_text_with;
use crate::error::Result;
use crate::header::Headers;
use crate::message::{content_type_of, disposition_of, is_leaf};
use crate::walker::Visitor;

/// Collects the decoded text of every non-attachment `text/plain` leaf.
///
/// All events, including the collected leaves with their original bytes,
/// are forwarded to the wrapped visitor.
#[derive(Debug, Default)]
pub struct PlainTextCollector<V> {
    inner: V,
    text: String,
    config: Config,
}

impl<V: Visitor> PlainTextCollector<V> {
    /// Wraps a visitor with the default configuration.
    pub fn new(inner: V) -> Self {
        Self::with_config(inner, Config::default())
    }

    /// Wraps a visitor.
    pub fn with_config(inner: V, config: Config) -> Self {
        Self {
            inner,
            text: String::new(),
            config,
        }
    }

    /// Text collected so far.
    #[must_use]
    pub fn plain_text(&self) -> &str {
        &self.text
    }

    /// The wrapped visitor.
    pub const fn inner(&self) -> &V {
        &self.inner
    }

    /// Unwraps the collector, returning the wrapped visitor.
    pub fn into_inner(self) -> V {
        self.inner
    }

    fn is_plain_body(headers: &Headers) -> bool {
        is_leaf(headers)
            && content_type_of(headers).is_ok_and(|ct| ct.is("text", "plain"))
            && !disposition_of(headers).is_some_and(|d| d.is_attachment())
    }
}

impl<V: Visitor> Visitor for PlainTextCollector<V> {
    fn accept(
        &mut self,
        part: &[u8],
        headers: &Headers,
        has_plain_sibling: bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<()> {
        if is_first && Self::is_plain_body(headers) {
            self.text
                .push_str(&decode_text_with(part, headers, &self.config));
        }
        self.inner
            .accept(part, headers, has_plain_sibling, is_first, is_last)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::visitor::MimePrinter;
    use crate::walker::walk;

    const MIXED: &str = concat!(
        "--b\r\n",
        "Content-Type: text/plain; charset=iso-8859-1\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "Ol=E1=20\r\n",
        "--b\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<p>ignored</p>\r\n",
        "--b\r\n",
        "Content-Type: text/plain\r\n",
        "Content-Disposition: attachment; filename=notes.txt\r\n",
        "\r\n",
        "attached\r\n",
        "--b\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "\r\n",
        "mundo\r\n",
        "--b--\r\n"
    );

    fn mixed_headers() -> Headers {
        let mut headers = Headers::new();
        headers.add("Content-Type", "multipart/mixed; boundary=b");
        headers
    }

    #[test]
    fn test_collects_plain_bodies() {
        let mut collector = PlainTextCollector::new(MimePrinter::new());
        walk(MIXED.as_bytes(), &mixed_headers(), &mut collector).unwrap();
        assert_eq!(collector.plain_text(), "Olá mundo");
    }

    #[test]
    fn test_forwards_original_bytes() {
        let mut collector = PlainTextCollector::new(MimePrinter::new());
        walk(MIXED.as_bytes(), &mixed_headers(), &mut collector).unwrap();

        let transcript = collector.inner().transcript();
        assert!(transcript.contains("Ol=E1=20"));
        assert!(transcript.contains("attached"));
        assert!(transcript.contains("<p>ignored</p>"));
        assert_eq!(collector.into_inner().depth(), 0);
    }

    #[test]
    fn test_single_leaf() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain; charset=utf-8");
        let mut collector = PlainTextCollector::new(MimePrinter::new());
        walk("Grüß dich".as_bytes(), &headers, &mut collector).unwrap();
        assert_eq!(collector.plain_text(), "Grüß dich");
    }
}
