//! Volca FM / DX7 voice patch converter
//!
//! Converts FM synthesizer voice data between the Yamaha DX7 SysEx exchange
//! format (as used by the Korg Volca FM and FM2) and editable text forms.
//!
//! # Features
//! - Bit-exact SysEx codec for single-voice (155 byte) and 32-voice
//!   cartridge (128 packed bytes per voice) dumps
//! - Reserved bits of the packed layout survive a decode/encode round trip
//! - 7-bit two's-complement checksum generation and verification
//! - JSON and CSV readers/writers and a human-readable text listing
//! - File type resolution from explicit names or file extensions
//!
//! # Quick start
//! ## Decode and re-encode a SysEx dump
//! ```no_run
//! use volca_convert::{syx, VoiceStore};
//! let data = std::fs::read("patch.syx").unwrap();
//! let mut store = VoiceStore::new();
//! let format = syx::decode(&data, &mut store).unwrap();
//! println!("{} voice(s) from a {} dump", store.len(), format);
//! let bytes = syx::encode(&store).unwrap();
//! assert_eq!(bytes.len(), format.file_len());
//! ```
//!
//! ## Render a cartridge as JSON
//! ```no_run
//! use volca_convert::{syx, text, VoiceStore};
//! let data = std::fs::read("bank.syx").unwrap();
//! let mut store = VoiceStore::new();
//! syx::decode(&data, &mut store).unwrap();
//! print!("{}", text::json::to_json(&store, true).unwrap());
//! ```

#![warn(missing_docs)]

pub mod convert; // File types, options and the read/write phases
pub mod syx; // SysEx codec
pub mod text; // JSON, CSV and TEXT collaborators
pub mod util; // Hex and name helpers
pub mod voice; // Voice model and field table

/// Error types for voice conversion
#[derive(thiserror::Error, Debug)]
pub enum VolcaError {
    /// The 6-byte prefix matches neither SysEx header
    #[error(
        "unrecognized SYX header: file = '{found}', single voice = '{single_voice}', cartridge = '{cartridge}'"
    )]
    MalformedHeader {
        /// Received prefix as hex
        found: String,
        /// Expected single-voice magic as hex
        single_voice: String,
        /// Expected cartridge magic as hex
        cartridge: String,
    },

    /// Buffer shorter than the layout requires
    #[error("truncated input: expected at least {expected} bytes, got {actual}")]
    TruncatedInput {
        /// Minimum number of bytes the layout needs
        expected: usize,
        /// Number of bytes actually available
        actual: usize,
    },

    /// SysEx output requested for a voice count the format cannot carry
    #[error("cannot write SYX data with {count} voices (only 1 or 32 are supported)")]
    UnsupportedVoiceCount {
        /// Number of voices in the store
        count: usize,
    },

    /// Error while parsing a text format
    #[error("Parse error: {0}")]
    ParseError(String),

    /// IO error from the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed CSV document or CSV writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for VolcaError {
    /// Converts a String into `VolcaError::Other`.
    ///
    /// Prefer the specific variants (`ParseError`, `ConfigError`) where the
    /// failure has a known category.
    fn from(msg: String) -> Self {
        VolcaError::Other(msg)
    }
}

impl From<&str> for VolcaError {
    fn from(msg: &str) -> Self {
        VolcaError::Other(msg.to_string())
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, VolcaError>;

// Public API exports
pub use convert::{ConvertOptions, FileType};
pub use syx::{decode, detect_format, encode, SyxFormat};
pub use voice::{Voice, VoiceStore};
