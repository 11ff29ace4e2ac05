//! Body collection and the attachment-ordering heuristic.

use crate::alternative::preferred_index;
use crate::config::Config;
use crate::content_type::ContentType;
use crate::decoder::decode_text_with;
use crate::error::Result;
use crate::header::Headers;
use crate::message::{content_type_of, disposition_of, is_leaf};
use crate::walker::Visitor;

/// One decoded text leaf that belongs to the displayable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySegment {
    /// Headers of the leaf.
    pub headers: Headers,
    /// Decoded text.
    pub text: String,
    /// True for `text/html`, false for `text/plain`.
    pub html: bool,
    /// True if the leaf came after an attachment and must be folded into
    /// the HTML body.
    pub folded: bool,
}

/// Collects the displayable body of a message.
///
/// Non-attachment `text/plain` and `text/html` leaves become body segments.
/// Inside a `multipart/alternative` only the branch [`crate::select_preferred`]
/// would pick contributes, and a plain leaf is dropped when its own container
/// also holds an HTML leaf. The first non-text leaf marks the start of the
/// attachment region; text leaves after it are folded into an HTML body,
/// converted from plain text where needed.
#[derive(Debug, Default)]
pub struct BodyCollector<V> {
    inner: V,
    segments: Vec<BodySegment>,
    positions: Vec<Position>,
    containers: Vec<Container>,
    open: Vec<usize>,
    attachment_seen: bool,
    needs_conversion: bool,
    config: Config,
}

/// A container seen during the walk with the content types of the children
/// entered so far.
#[derive(Debug, Default)]
struct Container {
    alternative: bool,
    children: Vec<Option<ContentType>>,
    html_body_child: bool,
}

/// Where a segment sits in the tree.
#[derive(Debug, Default)]
struct Position {
    parent: Option<usize>,
    /// `(container, child index)` for every enclosing alternative.
    branches: Vec<(usize, usize)>,
}

impl<V: Visitor> BodyCollector<V> {
    /// Wraps a visitor with the default configuration.
    pub fn new(inner: V) -> Self {
        Self::with_config(inner, Config::default())
    }

    /// Wraps a visitor.
    pub fn with_config(inner: V, config: Config) -> Self {
        Self {
            inner,
            segments: Vec::new(),
            positions: Vec::new(),
            containers: Vec::new(),
            open: Vec::new(),
            attachment_seen: false,
            needs_conversion: false,
            config,
        }
    }

    /// The wrapped visitor.
    pub const fn inner(&self) -> &V {
        &self.inner
    }

    /// Unwraps the collector, returning the wrapped visitor.
    pub fn into_inner(self) -> V {
        self.inner
    }

    /// Collected segments in document order, including the ones
    /// [`Self::body`] leaves out.
    #[must_use]
    pub fn segments(&self) -> &[BodySegment] {
        &self.segments
    }

    /// Returns true if a text leaf followed an attachment, so the body has
    /// to be rendered as HTML.
    #[must_use]
    pub const fn requires_html_conversion(&self) -> bool {
        self.needs_conversion
    }

    /// Returns the body text and its media type.
    ///
    /// The body is plain text when every selected segment is plain and no
    /// text followed an attachment. Otherwise it is HTML, with plain
    /// segments converted in document order.
    #[must_use]
    pub fn body(&self) -> (String, &'static str) {
        let selected = self.selected();
        if !self.needs_conversion && selected.iter().all(|segment| !segment.html) {
            let text = selected.iter().map(|segment| segment.text.as_str()).collect();
            return (text, "text/plain");
        }

        let html = selected
            .iter()
            .map(|segment| {
                if segment.html {
                    segment.text.clone()
                } else {
                    plain_to_html(&segment.text)
                }
            })
            .collect();
        (html, "text/html")
    }

    /// Headers of the segments that make up [`Self::body`].
    #[must_use]
    pub fn headers(&self) -> Vec<&Headers> {
        self.selected().into_iter().map(|segment| &segment.headers).collect()
    }

    fn selected(&self) -> Vec<&BodySegment> {
        let chosen: Vec<_> = self
            .containers
            .iter()
            .map(|container| preferred_index(&container.children))
            .collect();

        self.segments
            .iter()
            .zip(&self.positions)
            .filter(|(_, position)| {
                position
                    .branches
                    .iter()
                    .all(|&(container, child)| chosen[container] == Some(child))
            })
            .filter(|(segment, position)| segment.html || !self.has_html_sibling(position))
            .map(|(segment, _)| segment)
            .collect()
    }

    fn has_html_sibling(&self, position: &Position) -> bool {
        position
            .parent
            .is_some_and(|parent| self.containers[parent].html_body_child)
    }

    fn position(&self) -> Position {
        Position {
            parent: self.open.last().copied(),
            branches: self
                .open
                .iter()
                .filter(|&&id| self.containers[id].alternative)
                .map(|&id| (id, self.containers[id].children.len().saturating_sub(1)))
                .collect(),
        }
    }

    fn enter(&mut self, part: &[u8], headers: &Headers) {
        let content_type = content_type_of(headers).ok();
        if let Some(&parent) = self.open.last() {
            self.containers[parent].children.push(content_type.clone());
        }

        if !is_leaf(headers) {
            let alternative = content_type
                .as_ref()
                .is_some_and(|ct| ct.is("multipart", "alternative"));
            self.containers.push(Container {
                alternative,
                ..Container::default()
            });
            self.open.push(self.containers.len() - 1);
            return;
        }

        let content_type = content_type.unwrap_or_else(ContentType::implicit);
        if !content_type.is_text() {
            self.attachment_seen = true;
            return;
        }
        if self.attachment_seen {
            self.needs_conversion = true;
        }

        let html = content_type.is("text", "html");
        let is_body = (html || content_type.is("text", "plain"))
            && !disposition_of(headers).is_some_and(|d| d.is_attachment());
        if is_body {
            if let (true, Some(&parent)) = (html, self.open.last()) {
                self.containers[parent].html_body_child = true;
            }
            tracing::trace!(html, folded = self.attachment_seen, "collected body segment");
            self.positions.push(self.position());
            self.segments.push(BodySegment {
                headers: headers.clone(),
                text: decode_text_with(part, headers, &self.config),
                html,
                folded: self.attachment_seen,
            });
        }
    }
}

impl<V: Visitor> Visitor for BodyCollector<V> {
    fn accept(
        &mut self,
        part: &[u8],
        headers: &Headers,
        has_plain_sibling: bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<()> {
        if is_first {
            self.enter(part, headers);
        } else if is_last {
            self.open.pop();
        }
        self.inner
            .accept(part, headers, has_plain_sibling, is_first, is_last)
    }
}

/// Returns true if any `text/*` part follows a non-text part.
///
/// Applies the ordering rule of [`BodyCollector`] to a flattened list of leaf
/// headers, such as the output of [`crate::flatten`].
#[must_use]
pub fn requires_html_conversion(headers: &[&Headers]) -> bool {
    let mut attachment_seen = false;
    for headers in headers {
        let is_text = content_type_of(headers).is_ok_and(|ct| ct.is_text());
        if !is_text {
            attachment_seen = true;
        } else if attachment_seen {
            return true;
        }
    }
    false
}

/// Escapes plain text for inclusion in HTML, turning line breaks into `<br>`.
#[must_use]
pub fn plain_to_html(text: &str) -> String {
    let mut html = String::with_capacity(text.len() + text.len() / 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => html.push_str("<br>\n"),
            _ => html.push(c),
        }
    }
    html
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::visitor::MimePrinter;
    use crate::walker::walk;

    fn headers(content_type: &str) -> Headers {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type);
        headers
    }

    fn collect(body: &str) -> BodyCollector<MimePrinter> {
        let mut collector = BodyCollector::new(MimePrinter::new());
        walk(
            body.as_bytes(),
            &headers("multipart/mixed; boundary=b"),
            &mut collector,
        )
        .unwrap();
        collector
    }

    #[test]
    fn test_single_plain_leaf() {
        let mut collector = BodyCollector::new(MimePrinter::new());
        walk(b"hello", &headers("text/plain"), &mut collector).unwrap();

        assert_eq!(collector.body(), ("hello".to_string(), "text/plain"));
        assert!(!collector.requires_html_conversion());
        assert_eq!(collector.headers().len(), 1);
    }

    #[test]
    fn test_alternative_prefers_html() {
        let body = concat!(
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain\r\n",
            "--b\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>html</p>\r\n",
            "--b--\r\n"
        );
        let collector = collect(body);
        assert_eq!(collector.body(), ("<p>html</p>".to_string(), "text/html"));
        assert_eq!(collector.segments().len(), 2);
        assert_eq!(
            collector.headers()[0].get("Content-Type"),
            Some("text/html")
        );
    }

    #[test]
    fn test_attachment_is_not_body() {
        let body = concat!(
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "body\r\n",
            "--b\r\n",
            "Content-Type: image/jpeg\r\n",
            "Content-Disposition: attachment; filename=a.jpg\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "/9j/4AAQ\r\n",
            "--b--\r\n"
        );
        let collector = collect(body);
        assert_eq!(collector.body(), ("body".to_string(), "text/plain"));
        assert_eq!(collector.segments().len(), 1);
        assert!(!collector.requires_html_conversion());
    }

    #[test]
    fn test_text_after_attachment_is_folded() {
        let body = concat!(
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "Hello\r\n",
            "--b\r\n",
            "Content-Type: application/pdf\r\n",
            "\r\n",
            "%PDF\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "-- \nSignature & co\r\n",
            "--b--\r\n"
        );
        let collector = collect(body);

        assert!(collector.requires_html_conversion());
        let segments = collector.segments();
        assert_eq!(segments.len(), 2);
        assert!(!segments[0].folded);
        assert!(segments[1].folded);

        let (text, media_type) = collector.body();
        assert_eq!(media_type, "text/html");
        assert_eq!(text, "Hello-- <br>\nSignature &amp; co");
    }

    #[test]
    fn test_folded_after_html() {
        let body = concat!(
            "--b\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>Hi</p>\r\n",
            "--b\r\n",
            "Content-Type: image/png\r\n",
            "\r\n",
            "PNG\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "<footer>\r\n",
            "--b--\r\n"
        );
        let collector = collect(body);
        assert_eq!(
            collector.body(),
            ("<p>Hi</p>&lt;footer&gt;".to_string(), "text/html")
        );
        assert_eq!(collector.headers().len(), 2);
    }

    #[test]
    fn test_plain_footer_after_alternative_is_kept() {
        let body = concat!(
            "--b\r\n",
            "Content-Type: multipart/alternative; boundary=alt\r\n",
            "\r\n",
            "--alt\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "hi\r\n",
            "--alt\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>hi</p>\r\n",
            "--alt--\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "FOOTER\r\n",
            "--b--\r\n"
        );
        let collector = collect(body);

        assert!(!collector.requires_html_conversion());
        assert_eq!(
            collector.body(),
            ("<p>hi</p>FOOTER".to_string(), "text/html")
        );
        let types: Vec<_> = collector
            .headers()
            .iter()
            .map(|h| h.get("Content-Type").unwrap())
            .collect();
        assert_eq!(types, vec!["text/html", "text/plain"]);
    }

    #[test]
    fn test_alternative_prefers_nested_multipart() {
        let body = concat!(
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain\r\n",
            "--b\r\n",
            "Content-Type: multipart/related; boundary=rel\r\n",
            "\r\n",
            "--rel\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<img src=\"cid:x\">\r\n",
            "--rel--\r\n",
            "--b--\r\n"
        );
        let mut collector = BodyCollector::new(MimePrinter::new());
        walk(
            body.as_bytes(),
            &headers("multipart/alternative; boundary=b"),
            &mut collector,
        )
        .unwrap();

        assert_eq!(
            collector.body(),
            ("<img src=\"cid:x\">".to_string(), "text/html")
        );
        assert_eq!(collector.segments().len(), 2);
    }

    #[test]
    fn test_html_attachment_keeps_plain_body() {
        let body = concat!(
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "see attached\r\n",
            "--b\r\n",
            "Content-Type: text/html\r\n",
            "Content-Disposition: attachment; filename=page.html\r\n",
            "\r\n",
            "<p>page</p>\r\n",
            "--b--\r\n"
        );
        let collector = collect(body);
        assert_eq!(collector.body(), ("see attached".to_string(), "text/plain"));
    }

    #[test]
    fn test_plain_only_alternative() {
        let body = concat!(
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "first\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "second\r\n",
            "--b--\r\n"
        );
        let mut collector = BodyCollector::new(MimePrinter::new());
        walk(
            body.as_bytes(),
            &headers("multipart/alternative; boundary=b"),
            &mut collector,
        )
        .unwrap();

        assert_eq!(collector.body(), ("first".to_string(), "text/plain"));
    }

    #[test]
    fn test_requires_html_conversion_free_fn() {
        let plain = headers("text/plain");
        let html = headers("text/html");
        let image = headers("image/gif");

        assert!(!requires_html_conversion(&[]));
        assert!(!requires_html_conversion(&[&plain, &html]));
        assert!(!requires_html_conversion(&[&plain, &image]));
        assert!(requires_html_conversion(&[&plain, &image, &html]));
        assert!(requires_html_conversion(&[&image, &plain]));
    }

    #[test]
    fn test_plain_to_html() {
        assert_eq!(plain_to_html("a < b && c\r\nd"), "a &lt; b &amp;&amp; c<br>\nd");
        assert_eq!(plain_to_html("\"q\" 'x'"), "&quot;q&quot; &#39;x&#39;");
    }
}
