//! MIME transcript printer.

use crate::error::Result;
use crate::header::Headers;
use crate::message::{content_type_of, is_leaf};
use crate::walker::Visitor;

/// Reconstructs a textual MIME transcript from traversal events.
///
/// Leaves are written as their header block, an empty line and the raw
/// body. Containers open with the preamble line and the first delimiter;
/// each boundary event writes the next delimiter, and the last one the
/// closing `--boundary--`.
#[derive(Debug, Default, Clone)]
pub struct MimePrinter {
    result: Vec<u8>,
    boundaries: Vec<String>,
}

impl MimePrinter {
    /// Creates an empty printer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of containers currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.boundaries.len()
    }

    /// Returns the transcript, replacing invalid UTF-8.
    #[must_use]
    pub fn transcript(&self) -> String {
        String::from_utf8_lossy(&self.result).into_owned()
    }

    /// Returns the raw transcript bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.result
    }

    /// Consumes the printer, returning the transcript bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.result
    }
}

impl Visitor for MimePrinter {
    fn accept(
        &mut self,
        part: &[u8],
        headers: &Headers,
        _has_plain_sibling: bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<()> {
        if is_first {
            self.result.extend_from_slice(headers.to_string().as_bytes());
            self.result.push(b'\n');
            if is_leaf(headers) {
                self.result.extend_from_slice(part);
            } else {
                let boundary = content_type_of(headers)
                    .ok()
                    .and_then(|ct| ct.boundary().map(str::to_string))
                    .unwrap_or_default();
                self.result.extend_from_slice(
                    format!("\nThis is a multi-part message in MIME format.\n--{boundary}\n").as_bytes(),
                );
                self.boundaries.push(boundary);
            }
        } else if is_last {
            debug_assert!(!self.boundaries.is_empty(), "closing boundary without open container");
            let boundary = self.boundaries.pop().unwrap_or_default();
            self.result
                .extend_from_slice(format!("\n--{boundary}--\n").as_bytes());
        } else {
            let boundary = self.boundaries.last().map_or("", String::as_str);
            self.result
                .extend_from_slice(format!("\n--{boundary}\n").as_bytes());
        }
        Ok(())
    }
}
