// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use reqwest::{header, StatusCode};

use crate::errors::{Creation, TransportError};

/// Abstraction over the network leg of a batch send.
///
/// Implementations must be safe for concurrent use; one instance is shared by
/// every transmission worker. Cancellation is cooperative: the channel drops
/// the returned future when the per-send timeout fires or shutdown is
/// cancelled, which must abort the underlying request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs an already-encoded JSON body to the collector and resolves to
    /// the response status.
    async fn post_json(&self, body: String) -> Result<StatusCode, TransportError>;
}

/// Production transport backed by a shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpTransport {
    pub fn new(endpoint_address: &str) -> Result<Self, Creation> {
        let endpoint = reqwest::Url::parse(endpoint_address)
            .map_err(|e| Creation::InvalidEndpoint(format!("{endpoint_address}: {e}")))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Creation::HttpClient(e.to_string()))?;
        Ok(HttpTransport { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, body: String) -> Result<StatusCode, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .send()
            .await?;
        Ok(response.status())
    }
}
