//! Deterministic string hash.
//!
//! Every pseudo-random choice in a layout is derived from this hash, so it
//! has to reproduce the exact 32-bit signed wraparound of the classic
//! `h = (h << 5) - h + c` rolling hash, not just distribute well.

/// Hash a string to a non-negative 32-bit value.
///
/// Iterates UTF-16 code units, wrapping to a signed 32-bit integer after
/// every step, and returns the absolute value of the result. `i32::MIN`
/// maps to `2^31`, which is why the return type is `u32`.
pub fn string_hash(s: &str) -> u32 {
    let h = s.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
    });
    h.unsigned_abs()
}
