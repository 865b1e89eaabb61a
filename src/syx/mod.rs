//! DX7 SysEx (SYX) codec
//!
//! Two layouts share the same framing:
//!
//! - Single voice: `F0 43 00 00 01 1B`, 155 unpacked payload bytes,
//!   checksum, `F7` (163 bytes total)
//! - Cartridge: `F0 43 00 09 20 00`, 32 × 128 packed payload bytes,
//!   checksum, `F7` (4104 bytes total)
//!
//! Operator blocks are stored in reverse order in both layouts: operator 6
//! comes first in the stream, operator 1 last.

pub mod checksum;
pub mod header;
pub mod packed;
pub mod single;

use std::fmt;

use tracing::{debug, warn};

use crate::util;
use crate::voice::{Voice, VoiceStore};
use crate::{Result, VolcaError};

pub use header::{detect_format, is_syx_data};

/// Length of the SysEx header shared by both layouts
pub const HEADER_LEN: usize = 6;

/// Header of a single-voice dump
pub const SINGLE_VOICE_HEADER: [u8; HEADER_LEN] = [0xF0, 0x43, 0x00, 0x00, 0x01, 0x1B];

/// Header of a 32-voice cartridge dump
pub const CARTRIDGE_HEADER: [u8; HEADER_LEN] = [0xF0, 0x43, 0x00, 0x09, 0x20, 0x00];

/// End of SysEx marker
pub const SYSEX_END: u8 = 0xF7;

/// Payload length of a single-voice dump
pub const SINGLE_PAYLOAD_LEN: usize = 155;

/// Length of one packed voice slot in a cartridge
pub const PACKED_VOICE_LEN: usize = 128;

/// Number of voices in a cartridge
pub const CARTRIDGE_VOICE_COUNT: usize = 32;

/// Payload length of a cartridge dump
pub const CARTRIDGE_PAYLOAD_LEN: usize = PACKED_VOICE_LEN * CARTRIDGE_VOICE_COUNT;

/// Fixed width of the name field in both layouts
pub const NAME_LEN: usize = 10;

/// SysEx voice dump layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyxFormat {
    /// One voice, every parameter in its own byte
    SingleVoice,
    /// 32 voices, shared bytes packed per voice
    Cartridge,
}

impl SyxFormat {
    /// Layout able to carry `count` voices
    pub fn for_voice_count(count: usize) -> Result<Self> {
        match count {
            1 => Ok(SyxFormat::SingleVoice),
            CARTRIDGE_VOICE_COUNT => Ok(SyxFormat::Cartridge),
            _ => Err(VolcaError::UnsupportedVoiceCount { count }),
        }
    }

    /// 6-byte header magic
    pub fn header(self) -> [u8; HEADER_LEN] {
        match self {
            SyxFormat::SingleVoice => SINGLE_VOICE_HEADER,
            SyxFormat::Cartridge => CARTRIDGE_HEADER,
        }
    }

    /// Payload length between header and checksum
    pub fn payload_len(self) -> usize {
        match self {
            SyxFormat::SingleVoice => SINGLE_PAYLOAD_LEN,
            SyxFormat::Cartridge => CARTRIDGE_PAYLOAD_LEN,
        }
    }

    /// Complete file length: header, payload, checksum and terminator
    pub fn file_len(self) -> usize {
        HEADER_LEN + self.payload_len() + 2
    }

    /// Short human-readable label
    pub fn as_str(self) -> &'static str {
        match self {
            SyxFormat::SingleVoice => "single voice",
            SyxFormat::Cartridge => "cartridge",
        }
    }
}

impl fmt::Display for SyxFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode a SysEx dump and append its voices to `store`.
///
/// The store is only touched once the whole dump decoded successfully.
pub fn decode(data: &[u8], store: &mut VoiceStore) -> Result<SyxFormat> {
    let (format, voices) = decode_voices(data)?;
    store.extend(voices);
    Ok(format)
}

/// Decode a SysEx dump into its layout and voices.
pub fn decode_voices(data: &[u8]) -> Result<(SyxFormat, Vec<Voice>)> {
    let format = detect_format(data)?;

    let required = HEADER_LEN + format.payload_len();
    if data.len() < required {
        return Err(VolcaError::TruncatedInput {
            expected: required,
            actual: data.len(),
        });
    }
    let payload = &data[HEADER_LEN..required];

    let voices = match format {
        SyxFormat::SingleVoice => vec![single::decode_voice(payload)?],
        SyxFormat::Cartridge => packed::split_slots(payload)?
            .into_iter()
            .map(packed::decode_voice)
            .collect::<Result<Vec<_>>>()?,
    };

    check_trailer(payload, &data[required..]);

    debug!(
        "decoded {} voice(s) from {} dump ({} bytes)",
        voices.len(),
        format,
        data.len()
    );

    Ok((format, voices))
}

/// Encode the voices of `store` as a SysEx dump.
pub fn encode(store: &VoiceStore) -> Result<Vec<u8>> {
    encode_voices(store.as_slice())
}

/// Encode exactly 1 or 32 voices as a SysEx dump.
pub fn encode_voices(voices: &[Voice]) -> Result<Vec<u8>> {
    let format = SyxFormat::for_voice_count(voices.len())?;

    let mut output = vec![0u8; format.file_len()];
    output[..HEADER_LEN].copy_from_slice(&format.header());

    let payload_end = HEADER_LEN + format.payload_len();
    let payload = &mut output[HEADER_LEN..payload_end];
    match format {
        SyxFormat::SingleVoice => single::encode_voice(&voices[0], payload)?,
        SyxFormat::Cartridge => {
            for (voice, slot) in voices.iter().zip(payload.chunks_exact_mut(PACKED_VOICE_LEN)) {
                packed::encode_voice(voice, slot)?;
            }
        }
    }

    output[payload_end] = checksum::checksum(&output[HEADER_LEN..payload_end]);
    output[payload_end + 1] = SYSEX_END;

    debug!(
        "encoded {} voice(s) as {} dump ({} bytes)",
        voices.len(),
        format,
        output.len()
    );

    Ok(output)
}

/// Name field bytes to an in-memory name, verbatim.
pub(crate) fn read_name(field: &[u8]) -> String {
    util::name_from_bytes(field)
}

/// Write a name into a fixed-width field: space padded, truncated to fit.
pub(crate) fn write_name(field: &mut [u8], name: &str) {
    field.fill(b' ');
    let bytes = util::name_to_bytes(name);
    let len = bytes.len().min(field.len());
    field[..len].copy_from_slice(&bytes[..len]);
}

/// Warn about a stale checksum or a missing terminator. Neither fails a
/// decode.
fn check_trailer(payload: &[u8], trailer: &[u8]) {
    match trailer.first() {
        Some(&stored) if !checksum::verify(payload, stored) => {
            warn!(
                "checksum mismatch: stored 0x{:02X}, computed 0x{:02X}",
                stored,
                checksum::checksum(payload)
            );
        }
        Some(_) => {}
        None => debug!("dump has no checksum byte"),
    }

    match trailer.get(1) {
        Some(&SYSEX_END) => {}
        Some(&other) => warn!("expected end of SysEx (0xF7), found 0x{:02X}", other),
        None => debug!("dump has no end of SysEx marker"),
    }
}
