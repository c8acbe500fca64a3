use super::base62::encode_base62;

/// First path segments owned by fixed routes. A short code equal to one of
/// these would never reach the redirect handler.
pub const RESERVED_CODES: &[&str] = &["api", "health"];

pub fn is_reserved(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

/// Generates the next sequential short code by advancing `last_id` and base62-encoding it.
///
/// Codes for which `is_taken` returns `true` are skipped (a custom alias may already
/// occupy what the counter would produce), so the counter can move by more than one.
/// Returns `None` once the counter would overflow.
pub fn next_sequential_code<F>(last_id: &mut u64, mut is_taken: F) -> Option<String>
where
    F: FnMut(&str) -> bool,
{
    loop {
        *last_id = last_id.checked_add(1)?;
        let code = encode_base62(*last_id);

        if !is_taken(&code) {
            return Some(code);
        }
    }
}
