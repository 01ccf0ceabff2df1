// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Errors that can occur while constructing a channel.
#[derive(Debug, thiserror::Error)]
pub enum Creation {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid endpoint address: {0}")]
    InvalidEndpoint(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors raised by a [`crate::transport::Transport`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while encoding a batch into its wire payload.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to encode telemetry batch: {0}")]
    Json(#[from] serde_json::Error),

    #[error("serializer rejected item: {0}")]
    Item(String),
}

/// The ways a single batch transmission can fail. None of these ever reach a
/// producer; they are logged and counted at the transmission boundary and the
/// batch is abandoned.
#[derive(Debug, thiserror::Error)]
pub enum TransmitError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("send timed out")]
    Timeout,

    #[error("send cancelled by shutdown")]
    Cancelled,

    #[error("collector returned {0}")]
    Status(StatusCode),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Creation::InvalidConfig("capacity must be greater than zero".to_string());
        assert_eq!(
            error.to_string(),
            "invalid configuration: capacity must be greater than zero"
        );
    }

    #[test]
    fn test_status_error_display() {
        let error = TransmitError::Status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error.to_string(), "collector returned 503 Service Unavailable");
    }
}
