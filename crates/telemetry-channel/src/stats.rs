// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-instance diagnostic counters.
///
/// Owned by one channel so that several channels in the same process never
/// corrupt each other's counts. Producers observe delivery only through these
/// numbers; `send` itself reports nothing.
#[derive(Debug, Default)]
pub struct ChannelStats {
    batches_assembled: AtomicU64,
    items_assembled: AtomicU64,
    batches_sent: AtomicU64,
    items_sent: AtomicU64,
    items_dropped: AtomicU64,
    send_timeouts: AtomicU64,
    send_failures: AtomicU64,
}

/// Point-in-time copy of a channel's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StatsSnapshot {
    pub batches_assembled: u64,
    pub items_assembled: u64,
    pub batches_sent: u64,
    pub items_sent: u64,
    pub items_dropped: u64,
    pub send_timeouts: u64,
    pub send_failures: u64,
}

impl ChannelStats {
    /// Records a freshly detached batch and returns its 1-based index.
    pub(crate) fn record_batch(&self, items: usize) -> u64 {
        self.items_assembled
            .fetch_add(items as u64, Ordering::Relaxed);
        self.batches_assembled.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_delivery(&self, items: usize) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.items_sent.fetch_add(items as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_drop(&self) {
        self.items_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.send_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches_assembled: self.batches_assembled.load(Ordering::Relaxed),
            items_assembled: self.items_assembled.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            items_sent: self.items_sent.load(Ordering::Relaxed),
            items_dropped: self.items_dropped.load(Ordering::Relaxed),
            send_timeouts: self.send_timeouts.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}
