//! Text formats
//!
//! Human-editable renderings of a [`VoiceStore`](crate::VoiceStore):
//!
//! - [`json`]: array of voice objects, readable and writable
//! - [`csv`]: one row per voice, readable and writable
//! - [`listing`]: fixed-width TEXT listing, write only
//!
//! All of them lay out parameters in field table order and carry only the
//! unpacked parameter set; reserved `XXnn` placeholders never appear.

pub mod csv;
pub mod json;
pub mod listing;

use crate::{Result, VolcaError};

/// Narrow a parsed integer to a parameter byte.
pub(crate) fn param_byte(value: i64, what: impl FnOnce() -> String) -> Result<u8> {
    u8::try_from(value).map_err(|_| {
        VolcaError::ParseError(format!("{}: value {} out of range 0-255", what(), value))
    })
}
