//! Boundary-delimited splitting of `multipart/*` bodies.
//!
//! The body is fully buffered; every child is materialized as a [`Part`]
//! in document order before the walker descends into it.

use crate::error::{Error, Result};
use crate::message::Part;

/// Splits a multipart body into its child parts.
///
/// The preamble before the first delimiter and the epilogue after the
/// closing `--boundary--` are discarded. The line break preceding a
/// delimiter belongs to the delimiter, not to the part before it. Both
/// `\r\n` and bare `\n` line endings are accepted.
///
/// # Errors
///
/// Returns [`Error::MissingBoundary`] for an empty boundary and
/// [`Error::MalformedMultipart`] when the body has no opening delimiter or
/// ends without the closing delimiter.
pub fn split_parts(body: &[u8], boundary: &str) -> Result<Vec<Part>> {
    if boundary.is_empty() {
        return Err(Error::MissingBoundary);
    }
    let dash_boundary = format!("--{boundary}");
    let dash_boundary = dash_boundary.as_bytes();

    let Some(mut line_end) = find_first_delimiter(body, dash_boundary)? else {
        tracing::trace!(boundary, "multipart body has no children");
        return Ok(Vec::new());
    };

    let mut parts = Vec::new();
    loop {
        let (part_end, next, kind) =
            find_next_delimiter(body, line_end, dash_boundary).ok_or_else(|| {
                Error::MalformedMultipart(format!(
                    "missing closing delimiter for boundary {boundary:?}"
                ))
            })?;
        parts.push(Part::parse(&body[line_end..part_end]));

        if kind == Delimiter::Final {
            break;
        }
        line_end = next + delimiter_line(&body[next..]).len();
    }

    tracing::trace!(boundary, children = parts.len(), "split multipart body");
    Ok(parts)
}

#[derive(Debug, PartialEq, Eq)]
enum Delimiter {
    Part,
    Final,
    Invalid,
}

/// Skips the preamble, returning the end of the opening delimiter line or
/// `None` if the body opens with the closing delimiter.
fn find_first_delimiter(body: &[u8], dash_boundary: &[u8]) -> Result<Option<usize>> {
    let mut pos = 0;
    while pos < body.len() {
        let line = delimiter_line(&body[pos..]);
        match classify(line, dash_boundary) {
            Delimiter::Part => return Ok(Some(pos + line.len())),
            Delimiter::Final => return Ok(None),
            Delimiter::Invalid => pos += line.len(),
        }
    }
    Err(Error::MalformedMultipart(if body.is_empty() {
        "empty multipart body".to_string()
    } else {
        "no opening delimiter found".to_string()
    }))
}

/// Finds the next delimiter line at or after the line break that closed the
/// previous delimiter line.
///
/// Returns the end of the current part's content, the start of the
/// delimiter text and its kind. Lines that start with the boundary but are
/// not delimiters, such as `--b-x`, stay part content.
fn find_next_delimiter(
    body: &[u8],
    from: usize,
    dash_boundary: &[u8],
) -> Option<(usize, usize, Delimiter)> {
    let mut search = from.saturating_sub(1);
    while let Some(offset) = body[search..].iter().position(|&b| b == b'\n') {
        let newline = search + offset;
        let start = newline + 1;
        let kind = classify(delimiter_line(&body[start..]), dash_boundary);
        if kind != Delimiter::Invalid {
            let mut end = newline;
            if end > from && body[end - 1] == b'\r' {
                end -= 1;
            }
            return Some((end.max(from), start, kind));
        }
        search = start;
    }
    None
}

/// Returns the line at the start of `rest`, including its line break.
fn delimiter_line(rest: &[u8]) -> &[u8] {
    rest.iter()
        .position(|&b| b == b'\n')
        .map_or(rest, |idx| &rest[..=idx])
}

fn classify(line: &[u8], dash_boundary: &[u8]) -> Delimiter {
    let Some(rest) = line.strip_prefix(dash_boundary) else {
        return Delimiter::Invalid;
    };
    let (kind, rest) = rest
        .strip_prefix(b"--")
        .map_or((Delimiter::Part, rest), |rest| (Delimiter::Final, rest));
    // Transport padding after the delimiter
    if rest.iter().all(|b| b.is_ascii_whitespace()) {
        kind
    } else {
        Delimiter::Invalid
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parts() {
        let body = concat!(
            "This is the preamble.\r\n",
            "--abc\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "first\r\n",
            "--abc\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>second</p>\r\n",
            "--abc--\r\n",
            "epilogue\r\n"
        );
        let parts = split_parts(body.as_bytes(), "abc").unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(parts[0].body, b"first");
        assert_eq!(parts[1].headers.get("Content-Type"), Some("text/html"));
        assert_eq!(parts[1].body, b"<p>second</p>");
    }

    #[test]
    fn test_split_parts_bare_newlines() {
        let body = "--b\nContent-Type: text/plain\n\nline one\nline two\n\n--b--\n";
        let parts = split_parts(body.as_bytes(), "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"line one\nline two\n");
    }

    #[test]
    fn test_split_parts_boundary_prefix_in_content() {
        // "--bx" is not a delimiter for boundary "b"
        let body = "--b\n\n--bx\n--b--";
        let parts = split_parts(body.as_bytes(), "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"--bx");
    }

    #[test]
    fn test_split_parts_empty_part() {
        let body = "--b\n--b\nContent-Type: text/plain\n\nx\n--b--\n";
        let parts = split_parts(body.as_bytes(), "b").unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].headers.is_empty());
        assert!(parts[0].body.is_empty());
        assert_eq!(parts[1].body, b"x");
    }

    #[test]
    fn test_split_parts_transport_padding() {
        let body = "--b  \r\n\r\nx\r\n--b-- \r\n";
        let parts = split_parts(body.as_bytes(), "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"x");
    }

    #[test]
    fn test_split_parts_no_children() {
        let parts = split_parts(b"--b--\r\n", "b").unwrap();
        assert!(parts.is_empty());
    }

    #[test]
    fn test_split_parts_missing_boundary() {
        assert!(matches!(split_parts(b"--\r\n", ""), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_split_parts_unterminated() {
        let err = split_parts(b"--b\r\n\r\ntruncated", "b").unwrap_err();
        assert!(matches!(err, Error::MalformedMultipart(_)));
        assert!(err.is_structural());
    }

    #[test]
    fn test_split_parts_empty_body() {
        assert!(matches!(split_parts(b"", "b"), Err(Error::MalformedMultipart(_))));
    }

    #[test]
    fn test_split_parts_no_delimiter() {
        assert!(matches!(
            split_parts(b"just some text\r\n", "b"),
            Err(Error::MalformedMultipart(_))
        ));
    }

    #[test]
    fn test_split_parts_dash_suffix_is_content() {
        let body = "--b\r\n\r\n--b-x\r\n--b--\r\n";
        let parts = split_parts(body.as_bytes(), "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"--b-x");

        let body = "--b\n\nx\n--b-x\n--b  trailing\n--b--\n";
        let parts = split_parts(body.as_bytes(), "b").unwrap();
        assert_eq!(parts[0].body, b"x\n--b-x\n--b  trailing");
    }

    #[test]
    fn test_split_parts_dash_suffix_without_close() {
        let body = "--b\n\nx\n--b-x\n";
        assert!(matches!(
            split_parts(body.as_bytes(), "b"),
            Err(Error::MalformedMultipart(_))
        ));
    }
}
