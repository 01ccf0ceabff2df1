// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::Creation;

pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CAPACITY: usize = 500;
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1_000_000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);
pub const DEFAULT_MAX_CONCURRENCY: usize = 1;

/// Tuning knobs for one channel instance.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Destination URL for batch POSTs.
    pub endpoint_address: String,
    /// Timer period between automatic flushes.
    pub send_interval: Duration,
    /// Item-count threshold that triggers an immediate flush.
    pub capacity: usize,
    /// Hard cap on buffered items; arrivals beyond this are dropped.
    pub max_buffer_size: usize,
    /// Per-send timeout, also the shutdown drain budget.
    pub timeout: Duration,
    /// Maximum simultaneous in-flight batch sends. With the default of 1 the
    /// channel never overlaps a detach with an outstanding send.
    pub max_concurrency: usize,
    /// Forces `capacity = 1` so every submission ships immediately.
    pub developer_mode: bool,
}

impl ChannelConfig {
    pub fn new(endpoint_address: impl Into<String>) -> Self {
        ChannelConfig {
            endpoint_address: endpoint_address.into(),
            send_interval: DEFAULT_SEND_INTERVAL,
            capacity: DEFAULT_CAPACITY,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            developer_mode: false,
        }
    }

    /// Builds a config from `TELEMETRY_*` environment variables.
    /// `TELEMETRY_ENDPOINT` is required; every other option falls back to its
    /// default when unset or unparseable.
    pub fn from_env() -> Result<ChannelConfig, Creation> {
        let endpoint_address = env::var("TELEMETRY_ENDPOINT").map_err(|_| {
            Creation::InvalidConfig("TELEMETRY_ENDPOINT environment variable is not set".to_string())
        })?;

        Ok(ChannelConfig {
            endpoint_address,
            send_interval: Duration::from_secs(
                env_or("TELEMETRY_SEND_INTERVAL_SECS", DEFAULT_SEND_INTERVAL.as_secs()),
            ),
            capacity: env_or("TELEMETRY_CAPACITY", DEFAULT_CAPACITY),
            max_buffer_size: env_or("TELEMETRY_MAX_BUFFER_SIZE", DEFAULT_MAX_BUFFER_SIZE),
            timeout: Duration::from_secs(env_or(
                "TELEMETRY_TIMEOUT_SECS",
                DEFAULT_TIMEOUT.as_secs(),
            )),
            max_concurrency: env_or("TELEMETRY_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY),
            developer_mode: env::var("TELEMETRY_DEVELOPER_MODE")
                .map(|val| val.to_lowercase() == "true")
                .unwrap_or(false),
        })
    }

    pub(crate) fn validate(&self) -> Result<(), Creation> {
        if self.endpoint_address.is_empty() {
            return Err(Creation::InvalidConfig(
                "endpoint address must not be empty".to_string(),
            ));
        }
        if self.capacity == 0 {
            return Err(Creation::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_buffer_size == 0 {
            return Err(Creation::InvalidConfig(
                "max buffer size must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(Creation::InvalidConfig(
                "max concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: FromStr + Copy>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|val| val.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = ChannelConfig::new("http://localhost:8887/intake");
        assert_eq!(config.send_interval, Duration::from_secs(5));
        assert_eq!(config.capacity, 500);
        assert_eq!(config.max_buffer_size, 1_000_000);
        assert_eq!(config.timeout, Duration::from_secs(100));
        assert_eq!(config.max_concurrency, 1);
        assert!(!config.developer_mode);
    }

    #[test]
    #[serial]
    fn test_error_if_no_endpoint_env_var() {
        env::remove_var("TELEMETRY_ENDPOINT");
        let config = ChannelConfig::from_env();
        assert!(config.is_err());
        assert_eq!(
            config.unwrap_err().to_string(),
            "invalid configuration: TELEMETRY_ENDPOINT environment variable is not set"
        );
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        env::set_var("TELEMETRY_ENDPOINT", "http://127.0.0.1:3333/intake");
        env::set_var("TELEMETRY_SEND_INTERVAL_SECS", "1");
        env::set_var("TELEMETRY_CAPACITY", "25");
        env::set_var("TELEMETRY_MAX_CONCURRENCY", "4");
        env::set_var("TELEMETRY_DEVELOPER_MODE", "TRUE");
        let config = ChannelConfig::from_env().unwrap();
        assert_eq!(config.endpoint_address, "http://127.0.0.1:3333/intake");
        assert_eq!(config.send_interval, Duration::from_secs(1));
        assert_eq!(config.capacity, 25);
        assert_eq!(config.max_concurrency, 4);
        assert!(config.developer_mode);
        env::remove_var("TELEMETRY_ENDPOINT");
        env::remove_var("TELEMETRY_SEND_INTERVAL_SECS");
        env::remove_var("TELEMETRY_CAPACITY");
        env::remove_var("TELEMETRY_MAX_CONCURRENCY");
        env::remove_var("TELEMETRY_DEVELOPER_MODE");
    }

    #[test]
    #[serial]
    fn test_unparseable_env_value_falls_back_to_default() {
        env::set_var("TELEMETRY_ENDPOINT", "http://127.0.0.1:3333/intake");
        env::set_var("TELEMETRY_CAPACITY", "not-a-number");
        let config = ChannelConfig::from_env().unwrap();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        env::remove_var("TELEMETRY_ENDPOINT");
        env::remove_var("TELEMETRY_CAPACITY");
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = ChannelConfig::new("http://localhost:8887/intake");
        config.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = ChannelConfig::new("http://localhost:8887/intake");
        config.max_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
