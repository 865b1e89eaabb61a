//! JSON reader and writer
//!
//! Each voice is one object:
//!
//! ```text
//! { "NAME": "...", "ALGO": n, "LFOR": n, "LPMD": n,
//!   "OP1": { "EGR1": n, ... }, ..., "OP6": { ... },
//!   "ALL": { "PTR1": n, ... } }
//! ```
//!
//! Key order follows the field table (serde_json is built with
//! `preserve_order`).

use serde::Deserialize;
use serde_json::{Map, Value};

use super::param_byte;
use crate::util::printable_name;
use crate::voice::fields::{
    global_key, operator_key, GLOBAL_FIELDS, GLOBAL_PREFIX, OPERATOR_COUNT, OPERATOR_FIELDS,
    TOP_LEVEL_FIELDS,
};
use crate::voice::{Voice, VoiceParams, VoiceStore};
use crate::{Result, VolcaError};

#[derive(Debug, Deserialize)]
struct JsonVoice {
    #[serde(rename = "NAME", default)]
    name: String,
    #[serde(flatten)]
    groups: Map<String, Value>,
}

fn voice_to_value(voice: &Voice) -> Value {
    let mut object = Map::new();
    object.insert("NAME".into(), Value::from(printable_name(voice.name())));
    for field in TOP_LEVEL_FIELDS {
        object.insert(field.into(), Value::from(voice.param(field)));
    }

    for number in 1..=OPERATOR_COUNT {
        let operator: Map<String, Value> = OPERATOR_FIELDS
            .iter()
            .map(|f| (f.to_string(), Value::from(voice.param(&operator_key(number, f)))))
            .collect();
        object.insert(format!("OP{number}"), Value::Object(operator));
    }

    let global: Map<String, Value> = GLOBAL_FIELDS
        .iter()
        .map(|f| (f.to_string(), Value::from(voice.param(&global_key(f)))))
        .collect();
    object.insert(GLOBAL_PREFIX.into(), Value::Object(global));

    Value::Object(object)
}

/// Render a store as a JSON array. Output always ends with a newline.
pub fn to_json(store: &VoiceStore, pretty: bool) -> Result<String> {
    let doc = Value::Array(store.iter().map(voice_to_value).collect());
    let mut text = if pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    text.push('\n');
    Ok(text)
}

fn read_byte(value: Option<&Value>, key: &str, index: usize) -> Result<u8> {
    let what = || format!("voice {}: {}", index + 1, key);
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => param_byte(v, what),
            None => Err(VolcaError::ParseError(format!(
                "{}: expected an integer, found {}",
                what(),
                n
            ))),
        },
        Some(other) => Err(VolcaError::ParseError(format!(
            "{}: expected an integer, found {}",
            what(),
            other
        ))),
    }
}

fn group<'a>(
    groups: &'a Map<String, Value>,
    name: &str,
    index: usize,
) -> Result<Option<&'a Map<String, Value>>> {
    match groups.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(VolcaError::ParseError(format!(
            "voice {}: {} must be an object",
            index + 1,
            name
        ))),
    }
}

fn voice_from_json(json: JsonVoice, index: usize) -> Result<Voice> {
    let mut params = VoiceParams::new();

    for field in TOP_LEVEL_FIELDS {
        params.insert(field.to_string(), read_byte(json.groups.get(field), field, index)?);
    }

    for number in 1..=OPERATOR_COUNT {
        let name = format!("OP{number}");
        let operator = group(&json.groups, &name, index)?;
        for field in OPERATOR_FIELDS {
            let key = operator_key(number, field);
            let value = operator.and_then(|m| m.get(field));
            params.insert(key.clone(), read_byte(value, &key, index)?);
        }
    }

    let global = group(&json.groups, GLOBAL_PREFIX, index)?;
    for field in GLOBAL_FIELDS {
        let key = global_key(field);
        let value = global.and_then(|m| m.get(field));
        params.insert(key.clone(), read_byte(value, &key, index)?);
    }

    Ok(Voice::new(json.name, params))
}

/// Parse a JSON array of voice objects.
///
/// Missing fields read as 0 and a missing name as empty. Unknown keys are
/// ignored.
pub fn from_json(text: &str) -> Result<Vec<Voice>> {
    let doc: Value = serde_json::from_str(text)?;
    let Value::Array(items) = doc else {
        return Err(VolcaError::ParseError(
            "expected a JSON array of voices".into(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let json: JsonVoice = serde_json::from_value(item).map_err(|e| {
                VolcaError::ParseError(format!("voice {}: {}", index + 1, e))
            })?;
            voice_from_json(json, index)
        })
        .collect()
}
