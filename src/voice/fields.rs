//! Field table
//!
//! Canonical parameter names and their order. The SysEx codec uses these to
//! name decoded bytes; the text writers use the order to lay out columns.

/// Number of FM operators in a voice
pub const OPERATOR_COUNT: usize = 6;

/// Per-operator parameter names, in wire/column order
pub const OPERATOR_FIELDS: [&str; 21] = [
    "EGR1", "EGR2", "EGR3", "EGR4", "EGL1", "EGL2", "EGL3", "EGL4", "LSBP", "LSLD", "LSRD",
    "LSLC", "LSRC", "ORS", "AMS", "KVS", "OLVL", "OSCM", "FREC", "FREF", "DETU",
];

/// Voice-global parameter names stored under the `ALL.` prefix
pub const GLOBAL_FIELDS: [&str; 16] = [
    "PTR1", "PTR2", "PTR3", "PTR4", "PTL1", "PTL2", "PTL3", "PTL4", "FDBK", "OKS", "LFOD",
    "LAMD", "LFOK", "LFOW", "MSP", "TRSP",
];

/// Voice-global parameters stored under bare keys
pub const TOP_LEVEL_FIELDS: [&str; 3] = ["ALGO", "LFOR", "LPMD"];

/// Reserved operator bits of the packed layout (`OPn.XXnn`)
pub const OPERATOR_RESERVED_FIELDS: [&str; 3] = ["XX11", "XX13", "XX15"];

/// Reserved global bits of the packed layout (bare keys)
pub const GLOBAL_RESERVED_FIELDS: [&str; 2] = ["XX08", "XX09"];

/// Prefix of voice-global keys
pub const GLOBAL_PREFIX: &str = "ALL";

/// Key of an operator parameter; `number` is 1-based (`OP1`..`OP6`).
pub fn operator_key(number: usize, field: &str) -> String {
    format!("OP{number}.{field}")
}

/// Key of a global parameter under the `ALL.` prefix.
pub fn global_key(field: &str) -> String {
    format!("{GLOBAL_PREFIX}.{field}")
}

/// Every key an unpacked (single-voice) decode produces.
pub fn unpacked_keys() -> Vec<String> {
    let mut keys: Vec<String> = TOP_LEVEL_FIELDS.iter().map(|f| f.to_string()).collect();
    for number in 1..=OPERATOR_COUNT {
        keys.extend(OPERATOR_FIELDS.iter().map(|f| operator_key(number, f)));
    }
    keys.extend(GLOBAL_FIELDS.iter().map(|f| global_key(f)));
    keys
}

/// Every key a packed (cartridge) decode produces: the unpacked set plus
/// the reserved placeholders.
pub fn packed_keys() -> Vec<String> {
    let mut keys = unpacked_keys();
    for number in 1..=OPERATOR_COUNT {
        keys.extend(
            OPERATOR_RESERVED_FIELDS
                .iter()
                .map(|f| operator_key(number, f)),
        );
    }
    keys.extend(GLOBAL_RESERVED_FIELDS.iter().map(|f| f.to_string()));
    keys
}

/// True for reserved placeholder keys (`XX08`, `OP3.XX13`, ...).
pub fn is_reserved_key(key: &str) -> bool {
    let field = key.rsplit('.').next().unwrap_or(key);
    OPERATOR_RESERVED_FIELDS.contains(&field) || GLOBAL_RESERVED_FIELDS.contains(&field)
}
