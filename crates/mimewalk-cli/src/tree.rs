//! Indented outline of a MIME tree.

use mimewalk::{Headers, Result, Visitor, content_type_of, disposition_of};

/// Visitor that renders one line per part, indented by nesting depth.
#[derive(Debug, Default)]
pub struct TreePrinter {
    depth: usize,
    output: String,
}

impl TreePrinter {
    /// Creates an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// The rendered outline.
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl Visitor for TreePrinter {
    fn accept(
        &mut self,
        part: &[u8],
        headers: &Headers,
        has_plain_sibling: bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<()> {
        if !is_first {
            if is_last {
                self.depth = self.depth.saturating_sub(1);
            }
            return Ok(());
        }

        let content_type = content_type_of(headers)?;
        let indent = "  ".repeat(self.depth);
        if content_type.is_multipart() {
            self.output
                .push_str(&format!("{indent}{}\n", content_type.media_type()));
            self.depth += 1;
            return Ok(());
        }

        let mut line = format!("{indent}{} ({} bytes)", content_type.media_type(), part.len());
        if let Some(disposition) = disposition_of(headers) {
            if disposition.is_attachment() {
                line.push_str(" attachment");
            }
            if let Some(filename) = disposition.filename() {
                line.push_str(&format!(" \"{filename}\""));
            }
        }
        if has_plain_sibling {
            line.push_str(" [plain sibling]");
        }
        line.push('\n');
        self.output.push_str(&line);
        Ok(())
    }
}
