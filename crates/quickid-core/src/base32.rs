//! Fixed-width base-32 fields
//!
//! Digits are `0-9` then `a-v`, so zero-padded fields of equal width sort
//! the same way as strings and as numbers.

/// Digit alphabet, in ascending value order
pub const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Width of the time field (milliseconds since the Unix epoch)
pub const TIME_WIDTH: usize = 9;

/// Width of the sequence field
pub const SEQ_WIDTH: usize = 4;

/// Shortest string accepted by the parser: both fields and an empty tag
pub const MIN_ID_LEN: usize = TIME_WIDTH + SEQ_WIDTH;

/// Number of distinct sequence values (32^4)
pub const SEQ_LIMIT: u32 = 1 << (5 * SEQ_WIDTH);

/// Append `value` to `buf`, left-padded with `'0'` to at least `width` digits.
///
/// Values needing more than `width` digits are written in full.
pub fn push_padded(buf: &mut String, mut value: u64, width: usize) {
    // u64::MAX is 13 base-32 digits
    let mut digits = [0u8; 13];
    let mut n = 0;
    loop {
        digits[n] = ALPHABET[(value & 0x1f) as usize];
        n += 1;
        value >>= 5;
        if value == 0 {
            break;
        }
    }

    for _ in n..width {
        buf.push('0');
    }
    for &d in digits[..n].iter().rev() {
        buf.push(d as char);
    }
}

/// Encode `value` left-padded with `'0'` to at least `width` digits.
pub fn encode_padded(value: u64, width: usize) -> String {
    let mut buf = String::with_capacity(width);
    push_padded(&mut buf, value, width);
    buf
}

fn digit_value(byte: u8) -> Option<u64> {
    match byte {
        b'0'..=b'9' => Some((byte - b'0') as u64),
        b'a'..=b'v' => Some((byte - b'a') as u64 + 10),
        b'A'..=b'V' => Some((byte - b'A') as u64 + 10),
        _ => None,
    }
}

/// Decode a base-32 digit string. Uppercase digits are accepted.
///
/// Returns `None` for an empty string, a byte outside the alphabet, or a
/// value that does not fit in a `u64`.
pub fn decode(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }

    s.bytes().try_fold(0u64, |acc, byte| {
        let digit = digit_value(byte)?;
        acc.checked_mul(32)?.checked_add(digit)
    })
}
