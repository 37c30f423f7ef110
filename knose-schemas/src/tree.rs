//! Realtime-store tree ingestion
//!
//! The store is one nested JSON object, four keys deep:
//! `device / sensor / profile label / timestamp key / record`. Nodes that are
//! not objects where an object is expected are skipped, so a partially written
//! or hand-edited dump still yields every well-formed record.

use std::collections::BTreeMap;

use knose_core::{FieldValue, Reading};
use serde_json::{Map, Value};

use crate::{SchemaError, SchemaResult};

/// Keys above a record: device, sensor, profile label, timestamp
pub const STORE_DEPTH: usize = 4;

/// Convert a JSON value into a record field
///
/// Nested objects and arrays are kept as their compact JSON text.
pub fn field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => FieldValue::Text(value.to_string()),
    }
}

/// Convert a record object into typed fields
pub fn record_fields(record: &Map<String, Value>) -> BTreeMap<String, FieldValue> {
    record
        .iter()
        .map(|(name, value)| (name.clone(), field_value(value)))
        .collect()
}

/// Slash-joined store path
pub fn store_path(segments: &[&str]) -> String {
    segments.join("/")
}

/// Flatten a whole store dump into readings
pub fn flatten_tree(root: &Value) -> Vec<Reading> {
    let mut readings = Vec::new();
    walk(root, &mut Vec::with_capacity(STORE_DEPTH), &mut readings);
    readings
}

/// Flatten the node found at `path` in the store
///
/// `path` holds the keys above `node`, e.g. `["Device_1", "BME_01"]` for a
/// sensor subtree fetched on its own.
pub fn flatten_subtree(node: &Value, path: &[&str]) -> SchemaResult<Vec<Reading>> {
    if path.len() > STORE_DEPTH {
        return Err(SchemaError::Layout {
            path: store_path(path),
            reason: "path is deeper than a record",
        });
    }
    let mut prefix = path.to_vec();
    let mut readings = Vec::new();
    walk(node, &mut prefix, &mut readings);
    Ok(readings)
}

fn walk<'a>(node: &'a Value, prefix: &mut Vec<&'a str>, out: &mut Vec<Reading>) {
    if prefix.len() == STORE_DEPTH {
        match node.as_object() {
            Some(record) => {
                let mut reading = Reading::new(prefix[0], prefix[1], prefix[2], prefix[3]);
                reading.fields = record_fields(record);
                out.push(reading);
            }
            None => log::debug!("Skipping non-object record at {}", store_path(prefix)),
        }
        return;
    }

    let Some(children) = node.as_object() else {
        log::debug!("Skipping non-object node at {}", store_path(prefix));
        return;
    };
    for (key, child) in children {
        prefix.push(key.as_str());
        walk(child, prefix, out);
        prefix.pop();
    }
}
