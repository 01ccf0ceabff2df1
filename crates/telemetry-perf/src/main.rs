// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::time::Instant;

use serde_json::json;
use telemetry_channel::channel::TelemetryChannel;
use telemetry_channel::config::ChannelConfig;
use telemetry_channel::item::TelemetryItem;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_EVENTS: usize = 40_000;
const MESSAGE_BYTES: usize = 1_000;

#[tokio::main]
pub async fn main() {
    let log_level = env::var("TELEMETRY_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());
    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match ChannelConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error creating channel config: {e}");
            return;
        }
    };

    let events: usize = env::var("TELEMETRY_PERF_EVENTS")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_EVENTS);
    let message = "a".repeat(MESSAGE_BYTES);

    info!("Sending {events} events to {}", config.endpoint_address);

    let channel = match TelemetryChannel::new(config) {
        Ok(channel) => channel,
        Err(e) => {
            error!("Error creating telemetry channel: {e}");
            return;
        }
    };

    let start = Instant::now();
    for seq in 0..events {
        channel.send(TelemetryItem::new(json!({
            "seq": seq,
            "message": message,
        })));
    }
    channel.flush_and_wait().await;
    channel.shutdown().await;

    let elapsed = start.elapsed();
    let rate = events as f64 / elapsed.as_secs_f64();
    let stats = channel.stats();

    info!("Finished in {elapsed:?} ({rate:.0} events/s)");
    info!(
        "Delivered {} items in {} batches, dropped {}, {} failures, {} timeouts",
        stats.items_sent,
        stats.batches_sent,
        stats.items_dropped,
        stats.send_failures,
        stats.send_timeouts
    );
}
