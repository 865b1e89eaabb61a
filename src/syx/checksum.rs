//! SysEx checksum
//!
//! 7-bit two's-complement sum check: adding the checksum to the sum of all
//! payload bytes yields zero in the low seven bits. Header and terminator
//! are not covered.

/// Compute the checksum of a payload.
pub fn checksum(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    sum.wrapping_neg() & 0x7F
}

/// Check a stored checksum byte against the payload.
pub fn verify(payload: &[u8], stored: u8) -> bool {
    checksum(payload) == stored
}
