// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::{SystemTime, UNIX_EPOCH};

/// One unit of telemetry submitted by a producer.
///
/// The payload is opaque to the channel; only the timestamp is interpreted, at
/// encode time, when it is rewritten into the numeric `time` field the
/// collector's line-oriented parser requires. Items are immutable once
/// submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryItem {
    payload: serde_json::Value,
    timestamp: SystemTime,
}

impl TelemetryItem {
    /// Creates an item stamped with the current wall-clock time.
    pub fn new(payload: serde_json::Value) -> Self {
        Self::with_timestamp(payload, SystemTime::now())
    }

    pub fn with_timestamp(payload: serde_json::Value, timestamp: SystemTime) -> Self {
        TelemetryItem { payload, timestamp }
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Timestamp as fractional seconds since the Unix epoch. Pre-epoch
    /// timestamps clamp to zero.
    pub(crate) fn unix_time_secs(&self) -> f64 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_unix_time_is_fractional() {
        let timestamp = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
        let item = TelemetryItem::with_timestamp(json!({"message": "hi"}), timestamp);
        assert!((item.unix_time_secs() - 1_700_000_000.25).abs() < 1e-6);
    }

    #[test]
    fn test_pre_epoch_timestamp_clamps_to_zero() {
        let timestamp = UNIX_EPOCH - Duration::from_secs(1);
        let item = TelemetryItem::with_timestamp(json!({}), timestamp);
        assert_eq!(item.unix_time_secs(), 0.0);
    }
}
