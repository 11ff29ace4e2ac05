//! Recursive MIME tree traversal.
//!
//! The walker parses each part's `Content-Type`, reports the part to a
//! [`Visitor`], and for `multipart/*` containers splits the body into
//! children and recurses into them in document order. After each child it
//! reports a boundary event for the enclosing container.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Message, content_type_of};
use crate::multipart::split_parts;

/// Receiver of traversal events.
///
/// `is_first` is true for the event that enters a part; the remaining
/// events for a container are boundaries, emitted once after each child,
/// with `is_last` set on the final one. For boundary events `part` and
/// `headers` describe the container, not the child just visited.
///
/// Returning an error aborts the traversal.
pub trait Visitor {
    /// Handles one traversal event.
    ///
    /// # Errors
    ///
    /// Any error is propagated out of the walk unchanged.
    fn accept(
        &mut self,
        part: &[u8],
        headers: &Headers,
        has_plain_sibling: bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<()>;
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn accept(
        &mut self,
        part: &[u8],
        headers: &Headers,
        has_plain_sibling: bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<()> {
        (**self).accept(part, headers, has_plain_sibling, is_first, is_last)
    }
}

impl<V: Visitor + ?Sized> Visitor for Box<V> {
    fn accept(
        &mut self,
        part: &[u8],
        headers: &Headers,
        has_plain_sibling: bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<()> {
        (**self).accept(part, headers, has_plain_sibling, is_first, is_last)
    }
}

/// Visitor that ignores every event; terminates a decorator chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVisitor;

impl Visitor for NullVisitor {
    fn accept(&mut self, _: &[u8], _: &Headers, _: bool, _: bool, _: bool) -> Result<()> {
        Ok(())
    }
}

/// Walks a part tree with the default configuration.
///
/// # Errors
///
/// Returns the first structural error (malformed `Content-Type`, missing
/// boundary, corrupt framing, nesting too deep) or visitor error.
pub fn walk(body: &[u8], headers: &Headers, visitor: &mut impl Visitor) -> Result<()> {
    Walker::new(&Config::default()).walk(body, headers, visitor)
}

/// Walks a part tree with the given configuration.
///
/// # Errors
///
/// See [`walk`].
pub fn walk_with_config(
    body: &[u8],
    headers: &Headers,
    visitor: &mut impl Visitor,
    config: &Config,
) -> Result<()> {
    Walker::new(config).walk(body, headers, visitor)
}

/// Walks a parsed message.
///
/// # Errors
///
/// See [`walk`].
pub fn walk_message(message: &Message, visitor: &mut impl Visitor, config: &Config) -> Result<()> {
    walk_with_config(&message.body, &message.headers, visitor, config)
}

/// Tree walker bound to a configuration.
#[derive(Debug, Clone, Copy)]
pub struct Walker<'a> {
    config: &'a Config,
}

impl<'a> Walker<'a> {
    /// Creates a walker.
    #[must_use]
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Walks the tree rooted at the given part.
    ///
    /// # Errors
    ///
    /// See [`walk`].
    pub fn walk<V: Visitor + ?Sized>(&self, body: &[u8], headers: &Headers, visitor: &mut V) -> Result<()> {
        self.visit(body, headers, visitor, false, 0)
    }

    fn visit<V: Visitor + ?Sized>(
        &self,
        body: &[u8],
        headers: &Headers,
        visitor: &mut V,
        has_plain_sibling: bool,
        depth: usize,
    ) -> Result<()> {
        let content_type = content_type_of(headers)?;

        if !content_type.is_multipart() {
            tracing::trace!(depth, media_type = %content_type.media_type(), "visiting leaf");
            return visitor.accept(body, headers, has_plain_sibling, true, false);
        }

        if depth >= self.config.max_depth {
            return Err(Error::NestingTooDeep(self.config.max_depth));
        }

        visitor.accept(body, headers, has_plain_sibling, true, false)?;

        let children = split_parts(body, content_type.boundary().unwrap_or_default())?;
        tracing::debug!(
            depth,
            media_type = %content_type.media_type(),
            children = children.len(),
            "visiting container"
        );

        let has_plain_child = children.iter().any(|child| {
            child
                .content_type()
                .is_ok_and(|ct| ct.is("text", "plain"))
        }) || (has_plain_sibling && content_type.is("multipart", "related"));

        if children.is_empty() {
            return visitor.accept(body, headers, has_plain_sibling, false, true);
        }

        let last = children.len() - 1;
        for (i, child) in children.iter().enumerate() {
            self.visit(&child.body, &child.headers, visitor, has_plain_child, depth + 1)?;
            visitor.accept(body, headers, has_plain_sibling, false, i == last)?;
        }

        Ok(())
    }
}
