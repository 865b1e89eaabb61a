//! SysEx header detection
//!
//! Classifies a dump as single voice or cartridge from its 6-byte prefix.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::combinator::value;
use nom::IResult;

use super::{SyxFormat, CARTRIDGE_HEADER, HEADER_LEN, SINGLE_VOICE_HEADER};
use crate::util::bytes_to_hex;
use crate::{Result, VolcaError};

fn syx_header(input: &[u8]) -> IResult<&[u8], SyxFormat> {
    alt((
        value(SyxFormat::SingleVoice, tag(&SINGLE_VOICE_HEADER[..])),
        value(SyxFormat::Cartridge, tag(&CARTRIDGE_HEADER[..])),
    ))(input)
}

/// Detect the dump layout from the header magic.
///
/// Fails with `TruncatedInput` below 6 bytes and with `MalformedHeader`
/// (carrying all three byte sequences as hex) when neither magic matches.
pub fn detect_format(data: &[u8]) -> Result<SyxFormat> {
    if data.len() < HEADER_LEN {
        return Err(VolcaError::TruncatedInput {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    }

    match syx_header(data) {
        Ok((_, format)) => Ok(format),
        Err(_) => Err(VolcaError::MalformedHeader {
            found: bytes_to_hex(&data[..HEADER_LEN]),
            single_voice: bytes_to_hex(&SINGLE_VOICE_HEADER),
            cartridge: bytes_to_hex(&CARTRIDGE_HEADER),
        }),
    }
}

/// Check whether data starts with either SysEx voice dump header.
pub fn is_syx_data(data: &[u8]) -> bool {
    syx_header(data).is_ok()
}
