// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The channel core: ingestion, trigger logic, transmission, lifecycle.
//!
//! One background scheduler task waits on a coalesced wake signal with a
//! `send_interval` deadline. Each wake detaches the buffered items into an
//! immutable batch and hands it to a transmission worker; a semaphore bounds
//! how many batches may be in flight, and with the default width of 1 a
//! detach never overlaps an outstanding send. Producers only ever touch the
//! buffer; nothing on the send path can block or fail them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use crate::buffer::SubmissionBuffer;
use crate::config::ChannelConfig;
use crate::encode::{self, JsonSerializer, TelemetrySerializer};
use crate::errors::{Creation, TransmitError};
use crate::item::TelemetryItem;
use crate::stats::{ChannelStats, StatsSnapshot};
use crate::transport::{HttpTransport, Transport};

struct ChannelInner {
    buffer: SubmissionBuffer,
    serializer: Arc<dyn TelemetrySerializer>,
    transport: Arc<dyn Transport>,
    stats: ChannelStats,
    /// Coalesced wake signal: holds at most one permit, so any number of
    /// threshold crossings or flush requests before the scheduler wakes
    /// collapse into a single wake.
    wake: Notify,
    /// Bounds in-flight batch sends; acquired before every detach.
    send_gate: Arc<Semaphore>,
    cancel: CancellationToken,
    enabled: AtomicBool,
    disposed: AtomicBool,
    capacity: AtomicUsize,
    capacity_backup: AtomicUsize,
    developer_mode: AtomicBool,
    send_interval: Duration,
    timeout: Duration,
}

/// Buffered batching channel for telemetry items.
///
/// Construction spawns the scheduler task, so a channel must be created
/// inside a tokio runtime. Submission is fire-and-forget: a full or disposed
/// channel drops silently, observable only through [`TelemetryChannel::stats`]
/// and debug logs. Call [`TelemetryChannel::shutdown`] for a drained stop;
/// dropping the channel instead tears the scheduler down without draining.
pub struct TelemetryChannel {
    inner: Arc<ChannelInner>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryChannel {
    /// Creates a channel shipping to `config.endpoint_address` over HTTP.
    pub fn new(config: ChannelConfig) -> Result<Self, Creation> {
        let transport = Arc::new(HttpTransport::new(&config.endpoint_address)?);
        Self::with_parts(config, transport, Arc::new(JsonSerializer))
    }

    /// Creates a channel with caller-supplied transport and serializer.
    pub fn with_parts(
        config: ChannelConfig,
        transport: Arc<dyn Transport>,
        serializer: Arc<dyn TelemetrySerializer>,
    ) -> Result<Self, Creation> {
        config.validate()?;

        let capacity = if config.developer_mode { 1 } else { config.capacity };
        let inner = Arc::new(ChannelInner {
            buffer: SubmissionBuffer::new(config.max_buffer_size),
            serializer,
            transport,
            stats: ChannelStats::default(),
            wake: Notify::new(),
            send_gate: Arc::new(Semaphore::new(config.max_concurrency)),
            cancel: CancellationToken::new(),
            enabled: AtomicBool::new(true),
            disposed: AtomicBool::new(false),
            capacity: AtomicUsize::new(capacity),
            capacity_backup: AtomicUsize::new(config.capacity),
            developer_mode: AtomicBool::new(config.developer_mode),
            send_interval: config.send_interval,
            timeout: config.timeout,
        });

        let scheduler = tokio::spawn(run_scheduler(Arc::clone(&inner)));
        Ok(TelemetryChannel {
            inner,
            scheduler: Mutex::new(Some(scheduler)),
        })
    }

    /// Submits one item. Never blocks and never fails: once the channel is
    /// disposed or the buffer is full the item is dropped, logged and
    /// counted.
    pub fn send(&self, item: TelemetryItem) {
        if self.inner.disposed.load(Ordering::Acquire) {
            self.inner.stats.record_drop();
            debug!("telemetry item dropped: channel is disposed");
            return;
        }

        match self.inner.buffer.enqueue(item) {
            Some(buffered) => {
                // `>=` rather than `==` so a capacity lowered while items are
                // already buffered still fires; extra signals coalesce.
                if buffered >= self.inner.capacity.load(Ordering::Acquire) {
                    self.inner.wake.notify_one();
                }
            }
            None => {
                self.inner.stats.record_drop();
                debug!(
                    "telemetry item dropped: buffer reached maximum size {}",
                    self.inner.buffer.max_size()
                );
            }
        }
    }

    /// Requests an immediate assemble-and-send, bypassing the timer.
    /// Fire-and-forget; use [`TelemetryChannel::flush_and_wait`] to await the
    /// outcome.
    pub fn flush(&self) {
        if self.inner.disposed.load(Ordering::Acquire) {
            return;
        }
        self.inner.wake.notify_one();
    }

    /// Assembles and sends the current buffer contents, returning once the
    /// send has completed, timed out or failed.
    pub async fn flush_and_wait(&self) {
        if self.inner.disposed.load(Ordering::Acquire) {
            return;
        }
        if let Some((permit, batch)) = acquire_batch(&self.inner).await {
            transmit(&self.inner, batch).await;
            drop(permit);
        }
    }

    /// Stops the channel: performs a final flush, waits for in-flight sends
    /// up to the configured timeout, then cancels whatever is still pending.
    /// Idempotent; a second call returns immediately.
    pub async fn shutdown(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.inner.enabled.store(false, Ordering::Release);
        // Wake the scheduler out of its interval wait; if the loop has
        // already exited the stored permit is simply never consumed.
        self.inner.wake.notify_one();

        #[allow(clippy::expect_used)]
        let scheduler = self.scheduler.lock().expect("lock poisoned").take();
        if let Some(scheduler) = scheduler {
            match tokio::time::timeout(self.inner.timeout, scheduler).await {
                Ok(Ok(())) => debug!("telemetry channel drained"),
                Ok(Err(e)) => error!("scheduler task failed during shutdown: {e}"),
                Err(_) => {
                    warn!(
                        "shutdown drain budget of {:?} elapsed, cancelling in-flight sends",
                        self.inner.timeout
                    );
                    self.inner.cancel.cancel();
                }
            }
        }
    }

    /// Toggles developer mode. Enabling saves the current capacity and forces
    /// every submission to trigger an immediate send; disabling restores the
    /// saved value. A threshold check racing the toggle may observe the
    /// previous capacity for one enqueue; that window is accepted rather than
    /// serializing every capacity read.
    pub fn set_developer_mode(&self, enabled: bool) {
        if self.inner.developer_mode.swap(enabled, Ordering::AcqRel) == enabled {
            return;
        }
        if enabled {
            let current = self.inner.capacity.load(Ordering::Acquire);
            self.inner.capacity_backup.store(current, Ordering::Release);
            self.inner.capacity.store(1, Ordering::Release);
        } else {
            let saved = self.inner.capacity_backup.load(Ordering::Acquire);
            self.inner.capacity.store(saved, Ordering::Release);
        }
    }

    pub fn developer_mode(&self) -> bool {
        self.inner.developer_mode.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity.load(Ordering::Acquire)
    }

    /// Adjusts the item-count trigger threshold. While developer mode is on
    /// the new value only takes effect once developer mode is disabled.
    pub fn set_capacity(&self, capacity: usize) {
        if capacity == 0 {
            warn!("ignoring capacity of zero");
            return;
        }
        if self.inner.developer_mode.load(Ordering::Acquire) {
            self.inner.capacity_backup.store(capacity, Ordering::Release);
        } else {
            self.inner.capacity.store(capacity, Ordering::Release);
        }
    }

    /// Number of items currently buffered.
    pub fn buffered(&self) -> usize {
        self.inner.buffer.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }
}

impl Drop for TelemetryChannel {
    fn drop(&mut self) {
        // Last-resort teardown for channels dropped without shutdown(): stop
        // the scheduler and abort in-flight sends without draining.
        if !self.inner.disposed.swap(true, Ordering::AcqRel) {
            self.inner.enabled.store(false, Ordering::Release);
            self.inner.wake.notify_one();
            self.inner.cancel.cancel();
        }
    }
}

/// Scheduler loop. Waits for a wake or the interval, performs one
/// assemble-and-send per iteration, and on shutdown runs a final pass before
/// draining the workers it spawned. The interval timer is re-created each
/// iteration, so it re-arms only after the previous cycle completed.
async fn run_scheduler(inner: Arc<ChannelInner>) {
    let workers = TaskTracker::new();

    while inner.enabled.load(Ordering::Acquire) {
        tokio::select! {
            _ = inner.wake.notified() => {}
            _ = tokio::time::sleep(inner.send_interval) => {}
        }
        assemble_and_send(&inner, &workers).await;
    }

    // Final flush for anything that arrived after the last cycle, then wait
    // for in-flight sends. A hung transport resolves through the per-send
    // timeout or the shutdown cancellation, so this wait terminates.
    assemble_and_send(&inner, &workers).await;
    workers.close();
    workers.wait().await;
    debug!("scheduler stopped");
}

async fn assemble_and_send(inner: &Arc<ChannelInner>, workers: &TaskTracker) {
    if let Some((permit, batch)) = acquire_batch(inner).await {
        let worker_inner = Arc::clone(inner);
        workers.spawn(async move {
            let _permit = permit;
            transmit(&worker_inner, batch).await;
        });
    }
}

/// Waits for a send slot, then detaches the buffer. Returns `None` for an
/// empty snapshot: no network call, no counters.
async fn acquire_batch(
    inner: &Arc<ChannelInner>,
) -> Option<(OwnedSemaphorePermit, Vec<TelemetryItem>)> {
    let permit = Arc::clone(&inner.send_gate).acquire_owned().await.ok()?;
    let batch = inner.buffer.detach_all();
    if batch.is_empty() {
        return None;
    }
    let index = inner.stats.record_batch(batch.len());
    debug!(
        "batch {index}: {} items in batch, {} items total",
        batch.len(),
        inner.stats.snapshot().items_assembled
    );
    Some((permit, batch))
}

/// Transmission boundary: every failure is logged and counted here, never
/// propagated, so one bad batch cannot stop future batches.
async fn transmit(inner: &ChannelInner, batch: Vec<TelemetryItem>) {
    let items = batch.len();
    match send_batch(inner, &batch).await {
        Ok(()) => {
            inner.stats.record_delivery(items);
            debug!("successfully sent batch of {items} items");
        }
        Err(TransmitError::Timeout) => {
            inner.stats.record_timeout();
            warn!(
                "send cancelled after {:?} timeout, batch of {items} items lost",
                inner.timeout
            );
        }
        Err(TransmitError::Cancelled) => {
            warn!("send aborted by shutdown, batch of {items} items lost");
        }
        Err(e) => {
            inner.stats.record_failure();
            error!("failed to send batch of {items} items: {e}");
        }
    }
}

async fn send_batch(inner: &ChannelInner, batch: &[TelemetryItem]) -> Result<(), TransmitError> {
    let body = encode::encode_batch(inner.serializer.as_ref(), batch)?;

    // Racing the request against the timeout and the shutdown token; losing
    // the race drops the request future, which aborts the transfer.
    tokio::select! {
        result = inner.transport.post_json(body) => {
            let status = result?;
            if status.is_success() {
                Ok(())
            } else {
                Err(TransmitError::Status(status))
            }
        }
        _ = tokio::time::sleep(inner.timeout) => Err(TransmitError::Timeout),
        _ = inner.cancel.cancelled() => Err(TransmitError::Cancelled),
    }
}
