//! Message batch decoding
//!
//! One arrival event carries a batch payload: a JSON array of message
//! entries. Decoding is tolerant per element; one malformed entry never
//! costs the rest of the batch, and an unparsable payload yields an empty
//! batch rather than an error.

use serde::Deserialize;

/// One message decoded from a batch payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Sender address; absent when the source did not carry one
    pub sender: Option<String>,
    /// Message body
    pub body: String,
}

/// Wire shape of one batch entry
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    from: Option<String>,
    body: String,
}

/// Decode a batch payload into its messages, preserving arrival order
#[must_use]
pub fn decode_batch(payload: &[u8]) -> Vec<DecodedMessage> {
    let entries = match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Array(entries)) => entries,
        Ok(other) => {
            tracing::warn!(
                kind = json_kind(&other),
                "batch payload is not a JSON array, dropping batch"
            );
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "unparsable batch payload, dropping batch");
            return Vec::new();
        }
    };

    let mut messages = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<RawEntry>(entry) {
            Ok(raw) => messages.push(DecodedMessage {
                sender: raw.from,
                body: raw.body,
            }),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed batch entry");
            }
        }
    }

    messages
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
