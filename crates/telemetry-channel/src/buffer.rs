// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Mutex;

use crate::item::TelemetryItem;

/// Append-only ingestion buffer shared by all producers.
///
/// The mutex guards only a vector push or a pointer-sized swap, so producers
/// contend for nanoseconds, never for the duration of a send. The size cap is
/// checked under the same lock, which keeps the `max_size` invariant strict:
/// the buffer never holds more than `max_size` items, and an item rejected
/// here is gone for good.
pub(crate) struct SubmissionBuffer {
    items: Mutex<Vec<TelemetryItem>>,
    max_size: usize,
}

impl SubmissionBuffer {
    pub(crate) fn new(max_size: usize) -> Self {
        SubmissionBuffer {
            items: Mutex::new(Vec::new()),
            max_size,
        }
    }

    /// Appends an item, returning the post-append length, or `None` if the
    /// buffer is full and the item was dropped.
    pub(crate) fn enqueue(&self, item: TelemetryItem) -> Option<usize> {
        #[allow(clippy::expect_used)]
        let mut items = self.items.lock().expect("lock poisoned");
        if items.len() >= self.max_size {
            return None;
        }
        items.push(item);
        Some(items.len())
    }

    /// Atomically swaps in a fresh empty buffer and returns the previous
    /// contents in submission order. Concurrent enqueues land either in the
    /// returned snapshot or in the new buffer, never in both.
    pub(crate) fn detach_all(&self) -> Vec<TelemetryItem> {
        #[allow(clippy::expect_used)]
        let mut items = self.items.lock().expect("lock poisoned");
        std::mem::take(&mut *items)
    }

    pub(crate) fn len(&self) -> usize {
        #[allow(clippy::expect_used)]
        self.items.lock().expect("lock poisoned").len()
    }

    pub(crate) fn max_size(&self) -> usize {
        self.max_size
    }
}
