//! Attachment collection.

use crate::content_type::ContentType;
use crate::encoding::decode_header;
use crate::error::Result;
use crate::header::Headers;
use crate::message::{Part, content_type_of, disposition_of, is_leaf};
use crate::walker::Visitor;

/// An attachment with its transfer-decoded content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attachment {
    /// Headers of the attachment part.
    pub headers: Headers,
    /// Content after transfer decoding; no charset conversion is applied.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_base64"))]
    pub data: Vec<u8>,
}

impl Attachment {
    /// Builds an attachment from a leaf part, undoing its transfer encoding.
    #[must_use]
    pub fn from_part(part: &Part) -> Self {
        Self {
            headers: part.headers.clone(),
            data: part.decode_body().into_owned(),
        }
    }

    /// File name from `Content-Disposition`, or the `name` parameter of
    /// `Content-Type`, with encoded-words decoded.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        disposition_of(&self.headers)
            .and_then(|d| d.filename().map(decode_header))
            .or_else(|| {
                content_type_of(&self.headers)
                    .ok()
                    .and_then(|ct| ct.name().map(decode_header))
            })
    }

    /// Lower-case `type/subtype` of the attachment.
    #[must_use]
    pub fn media_type(&self) -> String {
        content_type_of(&self.headers)
            .unwrap_or_else(|_| ContentType::new("application", "octet-stream"))
            .media_type()
    }

    /// Size of the decoded content in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The header block as written in transcripts.
    #[must_use]
    pub fn header_block(&self) -> String {
        self.headers.to_string()
    }
}

#[cfg(feature = "serde")]
fn serialize_base64<S: serde::Serializer>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    use base64::Engine;

    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
}

/// Collects attachment leaves.
///
/// A leaf is an attachment if its disposition is `attachment` or its media
/// type is neither `text/plain` nor `text/html`.
#[derive(Debug, Default)]
pub struct AttachmentsCollector<V> {
    inner: V,
    attachments: Vec<Attachment>,
}

impl<V: Visitor> AttachmentsCollector<V> {
    /// Wraps a visitor.
    pub const fn new(inner: V) -> Self {
        Self {
            inner,
            attachments: Vec::new(),
        }
    }

    /// Attachments collected so far, in document order.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Headers of the collected attachments.
    #[must_use]
    pub fn attachment_headers(&self) -> Vec<&Headers> {
        self.attachments.iter().map(|a| &a.headers).collect()
    }

    /// The wrapped visitor.
    pub const fn inner(&self) -> &V {
        &self.inner
    }

    /// Unwraps the collector, returning the attachments and the wrapped
    /// visitor.
    pub fn into_parts(self) -> (Vec<Attachment>, V) {
        (self.attachments, self.inner)
    }

    fn is_attachment(headers: &Headers) -> bool {
        if disposition_of(headers).is_some_and(|d| d.is_attachment()) {
            return true;
        }
        content_type_of(headers).is_ok_and(|ct| !ct.is("text", "plain") && !ct.is("text", "html"))
    }
}

impl<V: Visitor> Visitor for AttachmentsCollector<V> {
    fn accept(
        &mut self,
        part: &[u8],
        headers: &Headers,
        has_plain_sibling: bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<()> {
        if is_first && is_leaf(headers) && Self::is_attachment(headers) {
            let attachment = Attachment::from_part(&Part::new(headers.clone(), part.to_vec()));
            tracing::debug!(
                media_type = %attachment.media_type(),
                size = attachment.size(),
                "collected attachment"
            );
            self.attachments.push(attachment);
        }
        self.inner
            .accept(part, headers, has_plain_sibling, is_first, is_last)
    }
}
