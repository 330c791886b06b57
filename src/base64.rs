//! Lenient base64 decoding for payloads embedded in text.
//!
//! Accepts the standard and the URL-safe alphabet at the same time. Whitespace and control bytes
//! are skipped, decoding ends at the first `=` or `.` marker or at a tail too short for another
//! byte. Nothing is validated: symbols outside the alphabet decode as zero bits.
use crate::alloc::vec::Vec;

const INDEX: [u8; 256] = build_index();

const fn build_index() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 26 {
        table[b'A' as usize + i] = i as u8;
        table[b'a' as usize + i] = 26 + i as u8;
        i += 1;
    }
    let mut d = 0;
    while d < 10 {
        table[b'0' as usize + d] = 52 + d as u8;
        d += 1;
    }
    table[b'+' as usize] = 62;
    table[b'-' as usize] = 62;
    table[b'/' as usize] = 63;
    table[b'_' as usize] = 63;
    table[b',' as usize] = 63;
    table
}

fn value(symbol: u8) -> u8 {
    INDEX[usize::from(symbol)]
}

fn ends_input(symbol: u8) -> bool {
    symbol == b'=' || symbol == b'.' || !symbol.is_ascii()
}

/// Upper bound on the decoded size of `len` encoded bytes.
///
/// This is the allocation estimate only. It overshoots the decoded length of a clean input by up
/// to four bytes, and more when the text contains whitespace or stops early; the length of the
/// vector returned by [`decode`] is always exact.
///
/// [`decode`]: fn.decode.html
pub fn reserved_len(len: usize) -> usize {
    3 * (1 + len / 4) + 1
}

/// Decode base64 `text` into bytes.
///
/// ```
/// assert_eq!(lzwpack::base64::decode("QQ=="), [0x41]);
/// assert_eq!(lzwpack::base64::decode("SGVs\n bG8."), b"Hello");
/// ```
pub fn decode(text: impl AsRef<[u8]>) -> Vec<u8> {
    let text = text.as_ref();
    let mut output = Vec::with_capacity(reserved_len(text.len()));
    let mut symbols = text.iter().copied().filter(|&b| b > 0x20);

    loop {
        let (v1, v2) = match (symbols.next(), symbols.next()) {
            (Some(a), Some(b)) if !ends_input(a) && !ends_input(b) => (value(a), value(b)),
            _ => break,
        };
        output.push((v1 << 2) | ((v2 & 0x30) >> 4));

        let v3 = match symbols.next() {
            Some(c) if !ends_input(c) => value(c),
            _ => break,
        };
        output.push(((v2 & 0x0f) << 4) | ((v3 & 0x3c) >> 2));

        let v4 = match symbols.next() {
            Some(d) if !ends_input(d) => value(d),
            _ => break,
        };
        output.push(((v3 & 0x03) << 6) | v4);
    }

    output
}
