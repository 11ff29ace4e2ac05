//! UTF-7 (RFC 2152) decoding.
//!
//! `encoding_rs` follows the WHATWG encoding standard, which leaves UTF-7
//! out, yet it still shows up in mail from older clients.

use std::char::{REPLACEMENT_CHARACTER, decode_utf16};

const fn base64_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

struct ShiftState {
    units: Vec<u16>,
    bits: u32,
    n_bits: u32,
    empty: bool,
}

impl ShiftState {
    const fn new() -> Self {
        Self {
            units: Vec::new(),
            bits: 0,
            n_bits: 0,
            empty: true,
        }
    }

    fn push_sextet(&mut self, value: u8) {
        self.bits = (self.bits << 6) | u32::from(value);
        self.n_bits += 6;
        self.empty = false;
        if self.n_bits >= 16 {
            self.n_bits -= 16;
            #[allow(clippy::cast_possible_truncation)]
            self.units.push((self.bits >> self.n_bits) as u16);
            self.bits &= (1 << self.n_bits) - 1;
        }
    }

    /// Ends a shift sequence, appending the collected UTF-16 units.
    fn finish(&mut self, out: &mut String) {
        out.extend(decode_utf16(self.units.drain(..)).map(|r| r.unwrap_or(REPLACEMENT_CHARACTER)));
        self.bits = 0;
        self.n_bits = 0;
    }
}

/// Decodes UTF-7 bytes into a string.
///
/// Never fails: unpaired surrogates and non-ASCII input bytes become
/// U+FFFD.
#[must_use]
pub fn decode_utf7(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut shift: Option<ShiftState> = None;

    for &byte in bytes {
        if let Some(state) = shift.as_mut() {
            if let Some(value) = base64_value(byte) {
                state.push_sextet(value);
                continue;
            }

            state.finish(&mut out);
            let empty = state.empty;
            shift = None;

            if byte == b'-' {
                // "+-" is a literal plus sign
                if empty {
                    out.push('+');
                }
                continue;
            }
            if empty {
                out.push('+');
            }
        }

        match byte {
            b'+' => shift = Some(ShiftState::new()),
            0x00..=0x7f => out.push(char::from(byte)),
            _ => out.push(REPLACEMENT_CHARACTER),
        }
    }

    if let Some(mut state) = shift {
        state.finish(&mut out);
        if state.empty {
            out.push('+');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf7() {
        let inputs = [
            ("Hello, World+ACE-", "Hello, World!"),
            ("Hi Mom -+Jjo--!", "Hi Mom -☺-!"),
            ("+ZeVnLIqe-", "日本語"),
            ("Item 3 is +AKM-1.", "Item 3 is £1."),
            ("1 +- 1 = 2", "1 + 1 = 2"),
            ("A+ImIDkQ.", "A\u{2262}\u{0391}."),
            (
                "+APw-ber ihre mi+AN8-liche Lage+ADs- +ACI-wir",
                "über ihre mißliche Lage; \"wir",
            ),
        ];

        for (input, expected) in inputs {
            assert_eq!(decode_utf7(input.as_bytes()), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_decode_utf7_surrogate_pair() {
        // U+1F600 as D83D DE00
        assert_eq!(decode_utf7(b"+2D3eAA-"), "\u{1F600}");
    }

    #[test]
    fn test_decode_utf7_unterminated_shift() {
        assert_eq!(decode_utf7(b"abc+AKM"), "abc£");
        assert_eq!(decode_utf7(b"trailing +"), "trailing +");
    }

    #[test]
    fn test_decode_utf7_garbage_does_not_panic() {
        let out = decode_utf7(b"+000000000000000000000000 ");
        assert!(out.ends_with(' '));
        assert!(out.contains(REPLACEMENT_CHARACTER));
    }
}
