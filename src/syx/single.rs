//! Single-voice (unpacked) layout
//!
//! 155 payload bytes, one parameter per byte:
//! - Bytes 0-125: six 21-byte operator blocks, operator 6 first
//! - Bytes 126-144: 19 voice-global parameters
//! - Bytes 145-154: name

use tracing::debug;

use super::{read_name, write_name, NAME_LEN, SINGLE_PAYLOAD_LEN};
use crate::voice::fields::{is_reserved_key, operator_key, OPERATOR_COUNT, OPERATOR_FIELDS};
use crate::voice::{Voice, VoiceParams};
use crate::{Result, VolcaError};

/// Length of one operator block
pub const OPERATOR_BLOCK_LEN: usize = 21;

/// Offset of the voice-global block
pub const GLOBAL_OFFSET: usize = OPERATOR_BLOCK_LEN * OPERATOR_COUNT;

/// Offset of the name field
pub const NAME_OFFSET: usize = GLOBAL_OFFSET + GLOBAL_LAYOUT.len();

/// Keys of the voice-global block in byte order
pub const GLOBAL_LAYOUT: [&str; 19] = [
    "ALL.PTR1", "ALL.PTR2", "ALL.PTR3", "ALL.PTR4", "ALL.PTL1", "ALL.PTL2", "ALL.PTL3",
    "ALL.PTL4", "ALGO", "ALL.FDBK", "ALL.OKS", "LFOR", "ALL.LFOD", "LPMD", "ALL.LAMD",
    "ALL.LFOK", "ALL.LFOW", "ALL.MSP", "ALL.TRSP",
];

/// Offset of the block holding operator `index` (0-based).
fn operator_offset(index: usize) -> usize {
    OPERATOR_BLOCK_LEN * (OPERATOR_COUNT - 1 - index)
}

/// Decode a 155-byte payload into a voice without reserved keys.
pub fn decode_voice(payload: &[u8]) -> Result<Voice> {
    if payload.len() < SINGLE_PAYLOAD_LEN {
        return Err(VolcaError::TruncatedInput {
            expected: SINGLE_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }

    let mut params = VoiceParams::new();

    for index in 0..OPERATOR_COUNT {
        let start = operator_offset(index);
        let block = &payload[start..start + OPERATOR_BLOCK_LEN];
        for (field, &byte) in OPERATOR_FIELDS.iter().zip(block) {
            params.insert(operator_key(index + 1, field), byte);
        }
    }

    for (key, &byte) in GLOBAL_LAYOUT
        .iter()
        .zip(&payload[GLOBAL_OFFSET..NAME_OFFSET])
    {
        params.insert(key.to_string(), byte);
    }

    let name = read_name(&payload[NAME_OFFSET..NAME_OFFSET + NAME_LEN]);

    Ok(Voice::new(name, params))
}

/// Encode a voice into a 155-byte payload. Absent keys encode as 0.
///
/// Reserved cartridge keys have no place in this layout and are dropped.
pub fn encode_voice(voice: &Voice, payload: &mut [u8]) -> Result<()> {
    if payload.len() < SINGLE_PAYLOAD_LEN {
        return Err(VolcaError::TruncatedInput {
            expected: SINGLE_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }

    let reserved = voice.params().keys().filter(|k| is_reserved_key(k)).count();
    if reserved > 0 {
        debug!(
            "dropping {} reserved key(s) of '{}' for single-voice layout",
            reserved,
            voice.name()
        );
    }

    for index in 0..OPERATOR_COUNT {
        let start = operator_offset(index);
        for (i, field) in OPERATOR_FIELDS.iter().enumerate() {
            payload[start + i] = voice.param(&operator_key(index + 1, field));
        }
    }

    for (i, key) in GLOBAL_LAYOUT.iter().enumerate() {
        payload[GLOBAL_OFFSET + i] = voice.param(key);
    }

    write_name(&mut payload[NAME_OFFSET..NAME_OFFSET + NAME_LEN], voice.name());
    Ok(())
}
