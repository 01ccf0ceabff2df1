// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Buffered, batching telemetry channel.
//!
//! Producers hand individual telemetry items to a [`channel::TelemetryChannel`]
//! on their hot path; a background scheduler groups the items into batches and
//! ships each batch to a collector endpoint as a single JSON POST. Memory is
//! bounded by dropping the newest items once the buffer is full, and a failed
//! or timed-out send loses at most one batch without ever blocking producers.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod buffer;

pub mod channel;
pub mod config;
pub mod encode;
pub mod errors;
pub mod item;
pub mod stats;
pub mod transport;
