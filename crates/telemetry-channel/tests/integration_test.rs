// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use mockito::{Matcher, Server};
use serde_json::json;
use telemetry_channel::channel::TelemetryChannel;
use telemetry_channel::config::ChannelConfig;
use telemetry_channel::item::TelemetryItem;
use tokio::time::{sleep, timeout, Duration};

fn intake_config(server: &Server) -> ChannelConfig {
    let mut config = ChannelConfig::new(format!("{}/intake", server.url()));
    // Only explicit triggers should fire during a test.
    config.send_interval = Duration::from_secs(60);
    config.timeout = Duration::from_secs(5);
    config
}

#[tokio::test]
async fn channel_ships_batch_to_intake() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/intake")
        .match_header("content-type", "application/json; charset=utf-8")
        .with_status(202)
        .create_async()
        .await;

    let channel = TelemetryChannel::new(intake_config(&server)).expect("failed to create channel");
    channel.send(TelemetryItem::new(json!({"message": "hello"})));
    channel.flush_and_wait().await;

    mock.assert_async().await;
    let stats = channel.stats();
    assert_eq!(stats.items_sent, 1);
    assert_eq!(stats.batches_sent, 1);
    channel.shutdown().await;
}

#[tokio::test]
async fn multi_item_batch_posts_one_json_array() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/intake")
        .match_body(Matcher::Regex(r"^\[.*\]$".to_string()))
        .with_status(202)
        .create_async()
        .await;

    let channel = TelemetryChannel::new(intake_config(&server)).expect("failed to create channel");
    for seq in 0..3 {
        channel.send(TelemetryItem::new(json!({"seq": seq})));
    }
    channel.flush_and_wait().await;

    mock.assert_async().await;
    channel.shutdown().await;
}

#[tokio::test]
async fn single_item_batch_posts_bare_object() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/intake")
        .match_body(Matcher::Regex(r"^\{.*\}$".to_string()))
        .with_status(202)
        .create_async()
        .await;

    let channel = TelemetryChannel::new(intake_config(&server)).expect("failed to create channel");
    channel.send(TelemetryItem::new(json!({"message": "solo"})));
    channel.flush_and_wait().await;

    mock.assert_async().await;
    channel.shutdown().await;
}

#[tokio::test]
async fn reaching_capacity_flushes_without_waiting_for_the_timer() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/intake")
        .with_status(202)
        .create_async()
        .await;

    let mut config = intake_config(&server);
    config.capacity = 2;
    let channel = TelemetryChannel::new(config).expect("failed to create channel");

    channel.send(TelemetryItem::new(json!({"seq": 0})));
    channel.send(TelemetryItem::new(json!({"seq": 1})));

    let delivered = async {
        while !mock.matched_async().await {
            sleep(Duration::from_millis(50)).await;
        }
    };
    let result = timeout(Duration::from_secs(2), delivered).await;

    match result {
        Ok(_) => mock.assert_async().await,
        Err(_) => panic!("timed out before the intake received the batch"),
    }
    channel.shutdown().await;
}

#[tokio::test]
async fn failed_send_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/intake")
        .with_status(500)
        .with_body("Internal Server Error")
        .expect(1)
        .create_async()
        .await;

    let channel = TelemetryChannel::new(intake_config(&server)).expect("failed to create channel");
    channel.send(TelemetryItem::new(json!({"seq": 0})));
    channel.flush_and_wait().await;

    // A second cycle finds nothing buffered; the failed batch is gone.
    channel.flush_and_wait().await;

    mock.assert_async().await;
    let stats = channel.stats();
    assert_eq!(stats.send_failures, 1);
    assert_eq!(stats.items_sent, 0);
    channel.shutdown().await;
}

#[tokio::test]
async fn shutdown_drains_buffered_items() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/intake")
        .with_status(202)
        .create_async()
        .await;

    let channel = TelemetryChannel::new(intake_config(&server)).expect("failed to create channel");
    channel.send(TelemetryItem::new(json!({"seq": 0})));
    channel.send(TelemetryItem::new(json!({"seq": 1})));
    channel.shutdown().await;

    mock.assert_async().await;
    assert_eq!(channel.stats().items_sent, 2);
}
