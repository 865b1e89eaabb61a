//! TEXT listing
//!
//! Fixed-width, human-readable dump of every voice. Write only.

use std::fmt::Write;

use crate::util::{name_to_hex, printable_name};
use crate::voice::fields::{global_key, operator_key, GLOBAL_PREFIX, OPERATOR_COUNT};
use crate::voice::{Voice, VoiceStore};

/// Operator fields, grouped by output line
const OPERATOR_LINES: [[&str; 8]; 2] = [
    ["EGR1", "EGR2", "EGR3", "EGR4", "EGL1", "EGL2", "EGL3", "EGL4"],
    ["LSBP", "LSLD", "LSRD", "LSLC", "LSRC", "ORS", "AMS", "KVS"],
];

/// Last operator line; shorter than the others
const OPERATOR_TAIL: [&str; 5] = ["OLVL", "OSCM", "FREC", "FREF", "DETU"];

/// Global fields, grouped by output line
const GLOBAL_LINES: [[&str; 8]; 2] = [
    ["PTR1", "PTR2", "PTR3", "PTR4", "PTL1", "PTL2", "PTL3", "PTL4"],
    ["FDBK", "OKS", "LFOD", "LAMD", "LFOK", "LFOW", "MSP", "TRSP"],
];

/// One line of `FIELD nn` cells, split into two groups of four.
fn push_line(out: &mut String, voice: &Voice, fields: &[&str], key: impl Fn(&str) -> String) {
    out.push_str("  ");
    for (i, &field) in fields.iter().enumerate() {
        if i == 4 {
            out.push_str("  ");
        }
        let _ = write!(out, "  {:<4} {:>2}", field, voice.param(&key(field)));
    }
    out.push('\n');
}

fn push_voice(out: &mut String, voice: &Voice, extras: bool) {
    let label = format!("[{}]", printable_name(voice.name()));
    let _ = write!(
        out,
        "{:<12} ALGO {:>2}  LFOR {:>2}  LPMD {:>2}",
        label,
        voice.param("ALGO"),
        voice.param("LFOR"),
        voice.param("LPMD")
    );
    if extras {
        let _ = write!(out, "    NAME {}", name_to_hex(voice.name()));
    }
    out.push('\n');

    for number in 1..=OPERATOR_COUNT {
        let _ = writeln!(out, "  OP{number}");
        for line in &OPERATOR_LINES {
            push_line(out, voice, line, |f| operator_key(number, f));
        }
        push_line(out, voice, &OPERATOR_TAIL, |f| operator_key(number, f));
    }

    let _ = writeln!(out, "  {GLOBAL_PREFIX}");
    for line in &GLOBAL_LINES {
        push_line(out, voice, line, global_key);
    }
}

/// Render every voice as a TEXT listing, voices separated by a blank line.
///
/// With `extras` the header line of each voice also shows the raw name
/// bytes in hex.
pub fn to_text(store: &VoiceStore, extras: bool) -> String {
    let mut out = String::new();
    for (i, voice) in store.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        push_voice(&mut out, voice, extras);
    }
    out
}
