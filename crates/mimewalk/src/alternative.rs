//! `multipart/alternative` resolution and tree flattening.

use crate::config::Config;
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Part, content_type_of};
use crate::multipart::split_parts;

/// Picks the representative child of a `multipart/alternative`.
///
/// Preference, first match wins: a nested `multipart/*` child, then
/// `text/html`, then `text/plain`. Children with a malformed
/// `Content-Type` are never chosen. Returns `None` when no child qualifies.
#[must_use]
pub fn select_preferred(children: &[Part]) -> Option<&Part> {
    let media_types: Vec<_> = children.iter().map(|child| child.content_type().ok()).collect();
    preferred_index(&media_types).map(|idx| &children[idx])
}

/// Index of the preferred alternative among parsed child content types.
pub(crate) fn preferred_index(media_types: &[Option<ContentType>]) -> Option<usize> {
    position(media_types, ContentType::is_multipart)
        .or_else(|| position(media_types, |ct| ct.is("text", "html")))
        .or_else(|| position(media_types, |ct| ct.is("text", "plain")))
}

fn position(media_types: &[Option<ContentType>], matches: impl Fn(&ContentType) -> bool) -> Option<usize> {
    media_types
        .iter()
        .position(|ct| ct.as_ref().is_some_and(&matches))
}

/// Flattens a part tree into its effective leaves with the default
/// configuration.
///
/// # Errors
///
/// See [`flatten_with_config`].
pub fn flatten(body: &[u8], headers: &Headers) -> Result<Vec<Part>> {
    flatten_with_config(body, headers, &Config::default())
}

/// Flattens a part tree into its effective leaves.
///
/// Every `multipart/alternative` is replaced by the flattening of its
/// preferred child (or by nothing if it has none); other containers
/// contribute the flattening of all their children. Order is preserved.
///
/// # Errors
///
/// Returns structural errors exactly as the walker does.
pub fn flatten_with_config(body: &[u8], headers: &Headers, config: &Config) -> Result<Vec<Part>> {
    let mut leaves = Vec::new();
    collect_leaves(body, headers, config, 0, &mut leaves)?;
    Ok(leaves)
}

fn collect_leaves(
    body: &[u8],
    headers: &Headers,
    config: &Config,
    depth: usize,
    leaves: &mut Vec<Part>,
) -> Result<()> {
    let content_type = content_type_of(headers)?;
    if !content_type.is_multipart() {
        leaves.push(Part::new(headers.clone(), body.to_vec()));
        return Ok(());
    }
    if depth >= config.max_depth {
        return Err(Error::NestingTooDeep(config.max_depth));
    }

    let children = split_parts(body, content_type.boundary().unwrap_or_default())?;
    if content_type.is("multipart", "alternative") {
        match select_preferred(&children) {
            Some(chosen) => collect_leaves(&chosen.body, &chosen.headers, config, depth + 1, leaves)?,
            None => tracing::debug!(depth, "no usable alternative"),
        }
        return Ok(());
    }

    for child in &children {
        collect_leaves(&child.body, &child.headers, config, depth + 1, leaves)?;
    }
    Ok(())
}
