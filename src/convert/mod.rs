//! Conversion pipeline
//!
//! A conversion is two phases over one [`VoiceStore`]: a reader fills the
//! store from the input file, then a writer renders the store in the
//! output format.
//!
//! [`ConvertOptions::resolve`] turns raw command line values into a
//! validated plan; [`run`] executes it.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::text::{csv, json, listing};
use crate::voice::VoiceStore;
use crate::{syx, Result, VolcaError};

/// File formats known to the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// No file: read nothing
    None,
    /// DX7 SysEx dump
    Syx,
    /// JSON array of voices
    Json,
    /// CSV with one row per voice
    Csv,
    /// Human-readable listing (output only)
    Text,
}

impl FileType {
    /// Look up a type by name, case-insensitive (`TXT` is accepted for
    /// `TEXT`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "NONE" => Some(FileType::None),
            "SYX" => Some(FileType::Syx),
            "JSON" => Some(FileType::Json),
            "CSV" => Some(FileType::Csv),
            "TEXT" | "TXT" => Some(FileType::Text),
            _ => None,
        }
    }

    /// Detect a type from a `.syx`, `.json` or `.csv` extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "syx" => Some(FileType::Syx),
            "json" => Some(FileType::Json),
            "csv" => Some(FileType::Csv),
            _ => None,
        }
    }

    /// True if a reader exists for this type
    pub fn is_readable(self) -> bool {
        !matches!(self, FileType::Text)
    }

    /// True if a writer exists for this type
    pub fn is_writable(self) -> bool {
        !matches!(self, FileType::None)
    }

    /// Canonical upper-case name
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::None => "NONE",
            FileType::Syx => "SYX",
            FileType::Json => "JSON",
            FileType::Csv => "CSV",
            FileType::Text => "TEXT",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated conversion plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Input path; `None` when the input type is [`FileType::None`]
    pub input: Option<PathBuf>,
    /// Output path; `None` writes to stdout
    pub output: Option<PathBuf>,
    /// Format of the input
    pub input_type: FileType,
    /// Format of the output
    pub output_type: FileType,
    /// Simple output: no hex names in TEXT, no CSV header rows, compact JSON
    pub simple: bool,
}

impl ConvertOptions {
    /// Build a plan from raw command line values.
    ///
    /// Explicit type names win over extension detection. With input type
    /// `NONE` no file is read and `infile` is taken as the output path.
    /// The output type falls back to TEXT when neither a name nor a known
    /// extension is given. SYX output needs an output path.
    pub fn resolve(
        input_type: Option<&str>,
        output_type: Option<&str>,
        infile: Option<PathBuf>,
        outfile: Option<PathBuf>,
        simple: bool,
    ) -> Result<Self> {
        let explicit_input = input_type.map(parse_type).transpose()?;
        if explicit_input.is_some_and(|t| !t.is_readable()) {
            return Err(VolcaError::ConfigError(format!(
                "cannot read {} input",
                FileType::Text
            )));
        }

        let (input, output, input_type) = match explicit_input {
            Some(FileType::None) => {
                if let Some(extra) = &outfile {
                    warn!("ignoring extra argument '{}'", extra.display());
                }
                (None, infile, FileType::None)
            }
            Some(kind) => {
                let path = infile.ok_or_else(|| {
                    VolcaError::ConfigError("no input file given".to_string())
                })?;
                (Some(path), outfile, kind)
            }
            None => {
                let path = infile.ok_or_else(|| {
                    VolcaError::ConfigError("no input file given".to_string())
                })?;
                let kind = FileType::from_path(&path).ok_or_else(|| {
                    VolcaError::ConfigError(format!(
                        "unable to tell what kind of input file '{}' is; use -i",
                        path.display()
                    ))
                })?;
                (Some(path), outfile, kind)
            }
        };

        let output_type = match output_type.map(parse_type).transpose()? {
            Some(kind) if !kind.is_writable() => {
                return Err(VolcaError::ConfigError(format!(
                    "cannot write {} output",
                    kind
                )));
            }
            Some(kind) => kind,
            None => output
                .as_deref()
                .and_then(FileType::from_path)
                .unwrap_or(FileType::Text),
        };

        if output_type == FileType::Syx && output.is_none() {
            return Err(VolcaError::ConfigError(
                "SYX output must be written to a file".to_string(),
            ));
        }

        Ok(Self {
            input,
            output,
            input_type,
            output_type,
            simple,
        })
    }
}

fn parse_type(name: &str) -> Result<FileType> {
    FileType::from_name(name)
        .ok_or_else(|| VolcaError::ConfigError(format!("unknown file type '{name}'")))
}

/// Read `path` as `file_type` and append its voices to `store`.
///
/// Nothing is appended when the read fails.
pub fn read_input(path: &Path, file_type: FileType, store: &mut VoiceStore) -> Result<()> {
    let before = store.len();
    match file_type {
        FileType::None => return Ok(()),
        FileType::Syx => {
            let data = fs::read(path)?;
            let format = syx::decode(&data, store)?;
            info!("read {} dump from {}", format, path.display());
        }
        FileType::Json => {
            let data = read_text_file(path, file_type)?;
            let text = std::str::from_utf8(&data).map_err(|e| {
                VolcaError::ParseError(format!("{} is not UTF-8: {}", path.display(), e))
            })?;
            store.extend(json::from_json(text)?);
        }
        FileType::Csv => {
            let data = read_text_file(path, file_type)?;
            store.extend(csv::from_csv(&data)?);
        }
        FileType::Text => {
            return Err(VolcaError::ConfigError(format!(
                "cannot read {} input",
                file_type
            )));
        }
    }
    info!(
        "read {} voice(s) from {} ({})",
        store.len() - before,
        path.display(),
        file_type
    );
    Ok(())
}

/// Read a JSON or CSV file, refusing SysEx dumps given the wrong type.
fn read_text_file(path: &Path, file_type: FileType) -> Result<Vec<u8>> {
    let data = fs::read(path)?;
    if syx::is_syx_data(&data) {
        return Err(VolcaError::ConfigError(format!(
            "'{}' holds a SYX dump, not {}; use -i syx",
            path.display(),
            file_type
        )));
    }
    Ok(data)
}

/// Render `store` in `file_type`. `simple` drops the optional extras.
pub fn render(file_type: FileType, store: &VoiceStore, simple: bool) -> Result<Vec<u8>> {
    match file_type {
        FileType::Text => Ok(listing::to_text(store, !simple).into_bytes()),
        FileType::Csv => csv::to_csv(store, !simple),
        FileType::Json => Ok(json::to_json(store, !simple)?.into_bytes()),
        FileType::Syx => syx::encode(store),
        FileType::None => Err(VolcaError::ConfigError(format!(
            "cannot write {} output",
            file_type
        ))),
    }
}

/// Write rendered output to `path`, or to stdout when `path` is `None`.
pub fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, bytes)?;
            info!("wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Run one conversion; returns the number of voices converted.
pub fn run(options: &ConvertOptions) -> Result<usize> {
    let mut store = VoiceStore::new();
    if let Some(input) = &options.input {
        read_input(input, options.input_type, &mut store)?;
    }

    let bytes = render(options.output_type, &store, options.simple)?;
    write_output(options.output.as_deref(), &bytes)?;
    Ok(store.len())
}
