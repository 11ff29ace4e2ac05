//! Ready-made visitor chains over raw messages.

use crate::config::Config;
use crate::error::Result;
use crate::header::Headers;
use crate::message::Message;
use crate::visitor::{Attachment, AttachmentsCollector, BodyCollector, MimePrinter, PlainTextCollector};
use crate::walker::walk_message;

/// Result of [`extract_plain_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlainTextReport {
    /// Reconstructed MIME transcript.
    pub transcript: String,
    /// Concatenated text of all non-attachment `text/plain` leaves.
    pub plain_text: String,
}

/// Result of [`extract_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Extraction {
    /// Decoded subject of the message, if any.
    pub subject: Option<String>,
    /// Decoded `From`, address comments folded into display names.
    pub from: Option<String>,
    /// Decoded `To`, address comments folded into display names.
    pub to: Option<String>,
    /// Displayable body.
    pub body: String,
    /// `text/plain` or `text/html`.
    pub body_media_type: String,
    /// Headers of the leaves that make up the body.
    pub body_headers: Vec<Headers>,
    /// Attachments in document order.
    pub attachments: Vec<Attachment>,
    /// True if text followed an attachment and the body was rendered as HTML.
    pub requires_html_conversion: bool,
    /// Reconstructed MIME transcript.
    pub transcript: String,
}

/// Extracts the transcript and plain text of a raw message.
///
/// # Errors
///
/// Returns structural errors from the walk.
pub fn extract_plain_text(raw: &[u8]) -> Result<PlainTextReport> {
    extract_plain_text_with(raw, &Config::default())
}

/// Extracts the transcript and plain text of a raw message.
///
/// # Errors
///
/// Returns structural errors from the walk.
pub fn extract_plain_text_with(raw: &[u8], config: &Config) -> Result<PlainTextReport> {
    let message = Message::parse(raw);
    let mut collector = PlainTextCollector::with_config(MimePrinter::new(), config.clone());
    walk_message(&message, &mut collector, config)?;

    Ok(PlainTextReport {
        plain_text: collector.plain_text().to_string(),
        transcript: collector.into_inner().transcript(),
    })
}

/// Splits a raw message into body and attachments.
///
/// # Errors
///
/// Returns structural errors from the walk.
pub fn extract_parts(raw: &[u8]) -> Result<Extraction> {
    extract_parts_with(raw, &Config::default())
}

/// Splits a raw message into body and attachments.
///
/// # Errors
///
/// Returns structural errors from the walk.
pub fn extract_parts_with(raw: &[u8], config: &Config) -> Result<Extraction> {
    let message = Message::parse(raw);
    let mut collector =
        AttachmentsCollector::new(BodyCollector::with_config(MimePrinter::new(), config.clone()));
    walk_message(&message, &mut collector, config)?;

    let (attachments, body) = collector.into_parts();
    let (text, media_type) = body.body();
    tracing::debug!(
        media_type,
        attachments = attachments.len(),
        "extracted message parts"
    );

    Ok(Extraction {
        subject: message.subject(),
        from: message.from_display(),
        to: message.to_display(),
        body: text,
        body_media_type: media_type.to_string(),
        body_headers: body.headers().into_iter().cloned().collect(),
        attachments,
        requires_html_conversion: body.requires_html_conversion(),
        transcript: body.into_inner().transcript(),
    })
}
