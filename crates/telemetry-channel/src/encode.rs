// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batch payload encoding.
//!
//! The collector ingests batches through a line-oriented JSON parser that
//! cannot consume newline-joined objects and rejects string timestamps, so a
//! multi-item batch must be joined into one well-formed JSON array and every
//! object's `time` field must be numeric fractional Unix seconds. A one-item
//! batch ships as a bare object.

use serde_json::{json, Value};

use crate::errors::EncodeError;
use crate::item::TelemetryItem;

/// Produces the canonical JSON encoding of one telemetry item.
///
/// This is the seam for schema-aware encoders; the channel itself never
/// interprets payloads. The returned value should be a JSON object; anything
/// else is wrapped under a `data` key so the numeric `time` field can still be
/// attached.
pub trait TelemetrySerializer: Send + Sync {
    fn serialize(&self, item: &TelemetryItem) -> Result<Value, EncodeError>;
}

/// Default serializer: the submitted payload already is the wire object.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl TelemetrySerializer for JsonSerializer {
    fn serialize(&self, item: &TelemetryItem) -> Result<Value, EncodeError> {
        Ok(item.payload().clone())
    }
}

/// Encodes a non-empty batch into its request body.
pub(crate) fn encode_batch(
    serializer: &dyn TelemetrySerializer,
    batch: &[TelemetryItem],
) -> Result<String, EncodeError> {
    let mut objects = Vec::with_capacity(batch.len());
    for item in batch {
        let serialized = serializer.serialize(item)?;
        objects.push(with_numeric_time(serialized, item.unix_time_secs()));
    }

    let body = if objects.len() == 1 {
        serde_json::to_string(&objects[0])?
    } else {
        serde_json::to_string(&Value::Array(objects))?
    };
    Ok(body)
}

fn with_numeric_time(value: Value, unix_secs: f64) -> Value {
    match value {
        Value::Object(mut fields) => {
            fields.insert("time".to_string(), json!(unix_secs));
            Value::Object(fields)
        }
        other => json!({ "data": other, "time": unix_secs }),
    }
}
