//! Display form of address list headers.

/// Rewrites an address list so RFC 822 comments become display names.
///
/// `john@example.com (John Doe)` turns into `"John Doe" <john@example.com>`.
/// A comment is used only when the address has no display name of its own.
/// Entries without an `@` are dropped. Groups are not understood; `,` and
/// `;` both separate entries.
#[must_use]
pub fn fold_address_comments(raw: &str) -> String {
    raw.split([',', ';'])
        .filter_map(fold_entry)
        .collect::<Vec<_>>()
        .join(", ")
}

fn fold_entry(entry: &str) -> Option<String> {
    let mut comments = Vec::new();
    let mut rest = String::with_capacity(entry.len());
    let mut remaining = entry;
    while let Some(open) = remaining.find('(') {
        let Some(close) = remaining[open..].find(')') else {
            break;
        };
        rest.push_str(&remaining[..open]);
        let comment = remaining[open + 1..open + close].trim();
        if !comment.is_empty() {
            comments.push(comment);
        }
        remaining = &remaining[open + close + 1..];
    }
    rest.push_str(remaining);

    let (name, address) = split_mailbox(rest.trim())?;
    let name = if name.is_empty() { comments.join(" ") } else { name };

    if name.is_empty() {
        Some(format!("<{address}>"))
    } else {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        Some(format!("\"{escaped}\" <{address}>"))
    }
}

/// Splits `Name <addr>` or a bare `addr`.
fn split_mailbox(mailbox: &str) -> Option<(String, &str)> {
    let (name, address) = match (mailbox.find('<'), mailbox.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            (mailbox[..open].trim(), mailbox[open + 1..close].trim())
        }
        _ => ("", mailbox),
    };
    if address.contains(char::is_whitespace) || !address.contains('@') {
        return None;
    }
    let name = name.trim_matches('"').trim().to_string();
    Some((name, address))
}
