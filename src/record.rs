use crate::filter::{Record, Scalar};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::BufRead;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to read records: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line} is not a JSON object")]
    NotAnObject { line: usize },
}

/// A JSON object flattened into filterable fields
///
/// Nested objects become dotted keys (`Resources.Memory`), arrays are joined
/// with commas and nulls are treated as missing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    fields: BTreeMap<String, Scalar>,
    raw: Value,
}

impl JsonRecord {
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(map) = &value else {
            return None;
        };
        let mut fields = BTreeMap::new();
        flatten_into(&mut fields, None, map);
        Some(Self { fields, raw: value })
    }

    pub fn fields(&self) -> &BTreeMap<String, Scalar> {
        &self.fields
    }

    /// The original JSON object
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl Record for JsonRecord {
    fn field(&self, name: &str) -> Option<Cow<'_, Scalar>> {
        self.fields.get(name).map(Cow::Borrowed)
    }
}

fn flatten_into(
    fields: &mut BTreeMap<String, Scalar>,
    prefix: Option<&str>,
    map: &Map<String, Value>,
) {
    for (key, value) in map {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(fields, Some(&key), nested),
            other => {
                if let Some(scalar) = to_scalar(other) {
                    fields.insert(key, scalar);
                }
            }
        }
    }
}

fn to_scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(Scalar::Boolean(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Scalar::Integer(i)),
            None => n.as_f64().map(Scalar::Float),
        },
        Value::String(s) => Some(Scalar::String(s.clone())),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(_) | Value::Array(_) => Some(item.to_string()),
                    other => to_scalar(other).map(|s| s.to_string()),
                })
                .collect();
            Some(Scalar::String(parts.join(",")))
        }
        Value::Object(_) => Some(Scalar::String(value.to_string())),
    }
}

/// Read one JSON object per line, skipping blank lines
pub fn read_json_lines(reader: impl BufRead) -> Result<Vec<JsonRecord>, RecordError> {
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line).map_err(|source| RecordError::Json {
            line: line_number,
            source,
        })?;
        let record =
            JsonRecord::from_value(value).ok_or(RecordError::NotAnObject { line: line_number })?;
        records.push(record);
    }

    log::debug!("read {} records", records.len());
    Ok(records)
}
