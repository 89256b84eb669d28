//! SinkHandle - manages a sink with isolated queue and worker task

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{MetricPoint, MetricSink, SinkOutcome};

use crate::metrics::SinkMetrics;

/// Batches a sink may have pending before `submit` waits
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

type WriteReply = Result<(), String>;

/// One batch for the worker plus where to report the result
struct WriteRequest {
    points: Arc<Vec<MetricPoint>>,
    reply: oneshot::Sender<WriteReply>,
}

/// In-flight write; resolve with [`PendingWrite::outcome`]
pub struct PendingWrite {
    sink: String,
    points: usize,
    reply: Result<oneshot::Receiver<WriteReply>, String>,
}

impl PendingWrite {
    /// Wait for the worker's verdict
    ///
    /// A worker that goes away without answering counts as a failed write.
    pub async fn outcome(self) -> SinkOutcome {
        let result = match self.reply {
            Ok(rx) => rx
                .await
                .unwrap_or_else(|_| Err("sink worker dropped the request".to_string())),
            Err(e) => Err(e),
        };
        SinkOutcome {
            sink: self.sink,
            points: self.points,
            result,
        }
    }
}

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send batches to worker
    tx: mpsc::Sender<WriteRequest>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: MetricSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a batch for the worker
    ///
    /// Waits only if the queue is full. The write itself runs on the worker
    /// task, so several sinks can be submitted to before any is awaited.
    pub async fn submit(&self, points: Arc<Vec<MetricPoint>>) -> PendingWrite {
        let count = points.len();
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = WriteRequest {
            points,
            reply: reply_tx,
        };

        let reply = match self.tx.send(request).await {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                Ok(reply_rx)
            }
            Err(_) => {
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                Err("sink worker stopped".to_string())
            }
        };

        PendingWrite {
            sink: self.name.clone(),
            points: count,
            reply,
        }
    }

    /// Write one batch and wait for the result
    pub async fn write(&self, points: Arc<Vec<MetricPoint>>) -> SinkOutcome {
        self.submit(points).await.outcome().await
    }

    /// Shutdown the sink worker gracefully
    ///
    /// Queued batches are still written before the sink is flushed and closed.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        // Drop sender to signal worker to stop
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

/// Worker task that consumes batches and writes to sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: MetricSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<WriteRequest>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(request) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let points = request.points.as_slice();
        let result = if points.is_empty() {
            Ok(())
        } else {
            sink.write(points).await
        };

        let reply = match result {
            Ok(()) => {
                metrics.record_write(points.len());
                Ok(())
            }
            Err(e) => {
                metrics.inc_failure_count();
                error!(sink = %name, points = points.len(), error = %e, "Write failed");
                Err(e.to_string())
            }
        };

        if request.reply.send(reply).is_err() {
            warn!(sink = %name, "Write result dropped, caller went away");
        }
    }

    // Cleanup
    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{ContractError, PowerFields};
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    /// Mock sink for testing
    struct MockSink {
        name: String,
        write_count: Arc<AtomicU64>,
        closed: Arc<AtomicBool>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl MockSink {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                write_count: Arc::new(AtomicU64::new(0)),
                closed: Arc::new(AtomicBool::new(false)),
                should_fail: false,
                delay_ms: 0,
            }
        }
    }

    impl MetricSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _points: &[MetricPoint]) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.write_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    fn batch(n: usize) -> Arc<Vec<MetricPoint>> {
        let points = (0..n)
            .map(|i| {
                MetricPoint::power(
                    format!("plug-{i}"),
                    PowerFields {
                        consumption_watts: i as f64,
                        watts_today: None,
                    },
                    Utc::now(),
                )
            })
            .collect();
        Arc::new(points)
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let sink = MockSink::new("test");
        let write_count = Arc::clone(&sink.write_count);
        let closed = Arc::clone(&sink.closed);

        let handle = SinkHandle::spawn(sink, 10);

        for _ in 0..5 {
            let outcome = handle.write(batch(2)).await;
            assert!(outcome.is_success());
            assert_eq!(outcome.points, 2);
        }

        assert_eq!(handle.metrics().points_written(), 10);
        handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 5);
        assert!(closed.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop_success() {
        let mut sink = MockSink::new("empty");
        sink.should_fail = true;
        let handle = SinkHandle::spawn(sink, 10);

        let outcome = handle.write(batch(0)).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.points, 0);
        assert_eq!(handle.metrics().failure_count(), 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let mut sink = MockSink::new("failing");
        sink.should_fail = true;

        let handle = SinkHandle::spawn(sink, 10);

        for _ in 0..3 {
            let outcome = handle.write(batch(1)).await;
            let err = outcome.result.unwrap_err();
            assert!(err.contains("mock failure"));
        }

        assert_eq!(handle.metrics().failure_count(), 3);
        assert_eq!(handle.metrics().points_written(), 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_batches() {
        let mut sink = MockSink::new("slow");
        sink.delay_ms = 20;
        let write_count = Arc::clone(&sink.write_count);

        let handle = SinkHandle::spawn(sink, 4);
        let mut pending = Vec::new();
        for _ in 0..3 {
            pending.push(handle.submit(batch(1)).await);
        }

        handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 3);
        for p in pending {
            assert!(p.outcome().await.is_success());
        }
    }
}
