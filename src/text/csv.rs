//! CSV reader and writer
//!
//! One row per voice: name, ALGO, LFOR, LPMD, then the 21 fields of each
//! operator (OP1 first) and the 16 global fields, 146 columns in all. Two
//! optional header rows label the operator group and field of each column.

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};

use super::param_byte;
use crate::util::printable_name;
use crate::voice::fields::{
    unpacked_keys, GLOBAL_FIELDS, GLOBAL_PREFIX, OPERATOR_COUNT, OPERATOR_FIELDS,
    TOP_LEVEL_FIELDS,
};
use crate::voice::{Voice, VoiceParams, VoiceStore};
use crate::{Result, VolcaError};

/// Number of columns in a voice row
pub const COLUMN_COUNT: usize =
    1 + TOP_LEVEL_FIELDS.len() + OPERATOR_COUNT * OPERATOR_FIELDS.len() + GLOBAL_FIELDS.len();

fn header_rows() -> (Vec<String>, Vec<String>) {
    let mut groups = vec![String::new(); 1 + TOP_LEVEL_FIELDS.len()];
    let mut fields = vec!["NAME".to_string()];
    fields.extend(TOP_LEVEL_FIELDS.iter().map(|f| f.to_string()));

    for number in 1..=OPERATOR_COUNT {
        for field in OPERATOR_FIELDS {
            groups.push(format!("OP{number}"));
            fields.push(field.to_string());
        }
    }
    for field in GLOBAL_FIELDS {
        groups.push(GLOBAL_PREFIX.to_string());
        fields.push(field.to_string());
    }

    (groups, fields)
}

/// Render a store as CSV, optionally preceded by the two header rows.
pub fn to_csv(store: &VoiceStore, with_header: bool) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());

    if with_header {
        let (groups, fields) = header_rows();
        writer.write_record(&groups)?;
        writer.write_record(&fields)?;
    }

    let keys = unpacked_keys();
    for voice in store {
        let mut row = Vec::with_capacity(COLUMN_COUNT);
        row.push(printable_name(voice.name()));
        row.extend(keys.iter().map(|k| voice.param(k).to_string()));
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| VolcaError::Io(e.into_error()))
}

/// Group label of a column in the first header row
fn is_group_label(cell: &str) -> bool {
    cell.is_empty()
        || cell == GLOBAL_PREFIX
        || cell
            .strip_prefix("OP")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn is_header_row(record: &StringRecord) -> bool {
    let mut cells = record.iter().map(str::trim);
    match cells.next() {
        Some("NAME") => true,
        Some("") => cells.all(is_group_label),
        _ => false,
    }
}

/// Parse CSV rows into voices, skipping header rows.
///
/// Header rows are the field row (first cell `NAME`) and the group row
/// (first cell empty, the rest empty or `OPn`/`ALL` labels).
pub fn from_csv(data: &[u8]) -> Result<Vec<Voice>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let keys = unpacked_keys();
    let mut voices = Vec::new();

    for record in reader.records() {
        let record = record?;
        if is_header_row(&record) {
            continue;
        }

        let line = record.position().map_or(0, |p| p.line());
        if record.len() < COLUMN_COUNT {
            return Err(VolcaError::ParseError(format!(
                "line {}: expected {} columns, found {}",
                line,
                COLUMN_COUNT,
                record.len()
            )));
        }

        let mut params = VoiceParams::new();
        for (key, cell) in keys.iter().zip(record.iter().skip(1)) {
            let what = || format!("line {line}: {key}");
            let value: i64 = cell.trim().parse().map_err(|_| {
                VolcaError::ParseError(format!("{}: '{}' is not an integer", what(), cell))
            })?;
            params.insert(key.clone(), param_byte(value, what)?);
        }

        voices.push(Voice::new(&record[0], params));
    }

    Ok(voices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_voice(name: &str, seed: u8) -> Voice {
        let params: VoiceParams = unpacked_keys()
            .into_iter()
            .enumerate()
            .map(|(i, k)| (k, seed.wrapping_add(i as u8) % 100))
            .collect();
        Voice::new(name, params)
    }

    #[test]
    fn test_column_count() {
        assert_eq!(COLUMN_COUNT, 146);
        assert_eq!(unpacked_keys().len(), COLUMN_COUNT - 1);
        let (groups, fields) = header_rows();
        assert_eq!(groups.len(), COLUMN_COUNT);
        assert_eq!(fields.len(), COLUMN_COUNT);
        assert_eq!(groups[4], "OP1");
        assert_eq!(groups[145], "ALL");
        assert_eq!(fields[145], "TRSP");
    }

    #[test]
    fn test_write_rows() {
        let store: VoiceStore = vec![sample_voice("PIANO 1   ", 0)].into();
        let text = String::from_utf8(to_csv(&store, true).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with(r#""NAME","ALGO","LFOR","LPMD","EGR1""#));
        assert!(lines[2].starts_with(r#""PIANO 1   ",0,"#));

        let simple = String::from_utf8(to_csv(&store, false).unwrap()).unwrap();
        assert_eq!(simple.lines().count(), 1);
        assert_eq!(simple.lines().next(), Some(lines[2]));
    }

    #[test]
    fn test_round_trip_with_headers() {
        let voices = vec![sample_voice("E.PIANO 1 ", 3), sample_voice("say \"hi\"", 40)];
        let store: VoiceStore = voices.clone().into();
        let data = to_csv(&store, true).unwrap();
        assert_eq!(from_csv(&data).unwrap(), voices);
    }

    #[test]
    fn test_name_made_printable() {
        let store: VoiceStore = vec![Voice::new("AB\0\0", VoiceParams::new())].into();
        let data = to_csv(&store, false).unwrap();
        let voices = from_csv(&data).unwrap();
        assert_eq!(voices[0].name(), "AB  ");
        assert_eq!(voices[0].get("OP6.DETU"), Some(0));
    }

    #[test]
    fn test_short_row_names_line() {
        let data = b",,,,\"OP1\"\n\"X\",1,2,3\n";
        let err = from_csv(data).unwrap_err();
        assert!(matches!(err, VolcaError::ParseError(ref m) if m.starts_with("line 2")));
    }

    #[test]
    fn test_blank_cell_is_not_a_header() {
        let mut row = vec!["\"LEAD\"".to_string(), String::new()];
        row.extend((2..COLUMN_COUNT).map(|_| "1".to_string()));
        let err = from_csv(row.join(",").as_bytes()).unwrap_err();
        assert!(
            matches!(err, VolcaError::ParseError(ref m) if m == "line 1: ALGO: '' is not an integer"),
            "{err}"
        );

        // Unnamed voice with a blank ALGO cell
        row[0] = String::new();
        assert!(matches!(
            from_csv(row.join(",").as_bytes()),
            Err(VolcaError::ParseError(_))
        ));
    }

    #[test]
    fn test_header_rows_detected() {
        let (groups, fields) = header_rows();
        let data = format!("{}\n{}\n", groups.join(","), fields.join(","));
        assert!(from_csv(data.as_bytes()).unwrap().is_empty());

        let mut record = StringRecord::from(vec!["", "", "OP12", "ALL"]);
        assert!(is_header_row(&record));
        record = StringRecord::from(vec!["", "", "OPX"]);
        assert!(!is_header_row(&record));
        record = StringRecord::from(vec!["ALGO", "1"]);
        assert!(!is_header_row(&record));
    }

    #[test]
    fn test_bad_value() {
        let mut row = vec!["\"X\"".to_string()];
        row.extend((1..COLUMN_COUNT).map(|_| "1".to_string()));
        row[10] = "abc".to_string();
        let err = from_csv(row.join(",").as_bytes()).unwrap_err();
        assert!(matches!(err, VolcaError::ParseError(ref m) if m.contains("abc")));

        row[10] = "256".to_string();
        let err = from_csv(row.join(",").as_bytes()).unwrap_err();
        assert!(matches!(err, VolcaError::ParseError(ref m) if m.contains("out of range")));
    }
}
