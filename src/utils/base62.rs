/// Digits, then lowercase, then uppercase. Index in this table is the digit value.
const CHARSET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE: u64 = 62;

/// Converts a number to base62 representation (0-9, a-z, A-Z)
pub fn encode_base62(mut num: u64) -> String {
    if num == 0 {
        return "0".to_string();
    }

    // u64::MAX needs 11 base62 digits
    let mut result = Vec::with_capacity(11);

    while num > 0 {
        result.push(CHARSET[(num % BASE) as usize] as char);
        num /= BASE;
    }

    result.iter().rev().collect()
}

/// Parses a base62 string produced by [`encode_base62`].
///
/// Returns `None` for an empty string, a character outside the alphabet,
/// or a value that does not fit in a `u64`.
#[cfg_attr(not(test), allow(dead_code))]
pub fn decode_base62(encoded: &str) -> Option<u64> {
    if encoded.is_empty() {
        return None;
    }

    encoded.bytes().try_fold(0u64, |acc, byte| {
        let digit = digit_value(byte)?;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

fn digit_value(byte: u8) -> Option<u64> {
    let value = match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'z' => byte - b'a' + 10,
        b'A'..=b'Z' => byte - b'A' + 36,
        _ => return None,
    };
    Some(value as u64)
}
