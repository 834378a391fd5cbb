//! Annotation parsing and per-object field extraction.

use serde_json::{Map, Value};
use thiserror::Error;

/// A parsed annotation: object name -> object fields, in document order.
pub type AnnotationRecord = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("annotation is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("annotation root must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// Parse raw annotation bytes (UTF-8 JSON) into a record.
pub fn parse_annotation(bytes: &[u8]) -> Result<AnnotationRecord, ParseError> {
    match serde_json::from_slice(bytes)? {
        Value::Object(record) => Ok(record),
        other => Err(ParseError::NotAnObject {
            found: json_kind(&other),
        }),
    }
}

/// Collect `field` from every object in `record`, in document order.
///
/// Entries that are not objects, or that lack `field`, are skipped. Array
/// values are kept whole (one entry per object, e.g. a box's four
/// coordinates).
///
/// A `null` value anywhere makes the whole extraction `None`, including the
/// values already collected from earlier objects. Callers treat `None` as
/// "annotation unusable"; an empty vector only means no object had the field.
pub fn extract_attribute<'a>(record: &'a AnnotationRecord, field: &str) -> Option<Vec<&'a Value>> {
    let mut values = Vec::new();

    for entry in record.values() {
        let Some(value) = entry.as_object().and_then(|fields| fields.get(field)) else {
            continue;
        };
        if value.is_null() {
            return None;
        }
        values.push(value);
    }

    Some(values)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
