//! Canonical JSON text form of level documents and order lists.
//!
//! Encoding is deterministic: fixed key order, 2-space indentation and
//! non-ASCII characters written as-is, so saving an unmodified document
//! reproduces the remote bytes exactly. Objects nested under unknown keys
//! keep the key order they were read with.

use serde_json::Value;
use thiserror::Error;

use crate::models::LevelDocument;

/// Errors produced while decoding or encoding documents.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Failed to encode document: {0}")]
    Encode(String),
}

/// Parses a level document, rejecting shapes that cannot be a level.
pub fn decode(bytes: &[u8]) -> Result<LevelDocument, CodecError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::Malformed(format!("invalid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| CodecError::Malformed("top-level value is not an object".to_string()))?;

    match object.get("records") {
        None | Some(Value::Null) => {}
        Some(Value::Array(records)) => {
            for (i, record) in records.iter().enumerate() {
                check_record_shape(i, record)?;
            }
        }
        Some(_) => {
            return Err(CodecError::Malformed(
                "`records` is not an array".to_string(),
            ))
        }
    }

    serde_json::from_value(value).map_err(|e| CodecError::Malformed(e.to_string()))
}

fn check_record_shape(index: usize, record: &Value) -> Result<(), CodecError> {
    let object = record.as_object().ok_or_else(|| {
        CodecError::Malformed(format!("records[{}] is not an object", index))
    })?;

    for key in ["user", "link"] {
        match object.get(key) {
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(CodecError::Malformed(format!(
                    "records[{}].{} is not a string",
                    index, key
                )))
            }
            None => {
                return Err(CodecError::Malformed(format!(
                    "records[{}] is missing `{}`",
                    index, key
                )))
            }
        }
    }
    Ok(())
}

/// Serializes a level document to its canonical text form.
pub fn encode(document: &LevelDocument) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec_pretty(document).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Parses an order list: a JSON array of record keys.
pub fn decode_order_list(bytes: &[u8]) -> Result<Vec<String>, CodecError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::Malformed(format!("invalid JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(CodecError::Malformed(
                "order list is not an array".to_string(),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(key) => Ok(key),
            _ => Err(CodecError::Malformed(format!(
                "order list entry {} is not a string",
                i
            ))),
        })
        .collect()
}
