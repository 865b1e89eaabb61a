//! Shared helpers for hex diagnostics and voice name bytes.
//!
//! Voice names travel as raw bytes on the wire. They are held in memory as a
//! `String` whose chars map 1:1 to those bytes (Latin-1), so any byte value
//! survives a decode/encode round trip.

/// Byte substituted for name chars that do not fit in a single byte.
pub const UNMAPPABLE_NAME_BYTE: u8 = b'?';

/// Format bytes as uppercase hex pairs separated by single spaces.
///
/// ```
/// assert_eq!(volca_convert::util::bytes_to_hex(&[0xF0, 0x43, 0x00]), "F0 43 00");
/// ```
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex dump of a voice name, one pair per name byte.
pub fn name_to_hex(name: &str) -> String {
    bytes_to_hex(&name_to_bytes(name))
}

/// Map raw name bytes to a `String`, one char per byte.
pub fn name_from_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Map a name back to raw bytes, one byte per char.
///
/// Chars above U+00FF cannot be represented and become
/// [`UNMAPPABLE_NAME_BYTE`].
pub fn name_to_bytes(name: &str) -> Vec<u8> {
    name.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(UNMAPPABLE_NAME_BYTE))
        .collect()
}

/// Replace chars outside printable ASCII (`0x20..=0x7E`) with spaces.
///
/// Used by every text writer; NUL padding and control bytes show up as
/// spaces in JSON, CSV and TEXT output.
pub fn printable_name(name: &str) -> String {
    name.chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { ' ' })
        .collect()
}
