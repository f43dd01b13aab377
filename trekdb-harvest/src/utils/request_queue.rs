//! Rate-limited request queue
//!
//! Serializes outbound wiki requests: operations run one at a time in
//! submission order, with a fixed pause after each one completes. The pause
//! is measured from completion to the next start, not start to start.
//!
//! At most one drain task exists. `enqueue` only appends while a drain is
//! running and spawns one when the queue was idle.
//!
//! The queue is an explicit object. Create one per process (CLI run) or per
//! server and share it through `Arc`/`Clone`; there is no global instance.

use crate::error::{HarvestError, HarvestResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

struct QueueState {
    jobs: VecDeque<Job>,
    draining: bool,
}

struct Inner {
    delay: Duration,
    state: Mutex<QueueState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// FIFO queue with completion-to-start spacing
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<Inner>,
}

impl RequestQueue {
    /// Create an idle queue
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay,
                state: Mutex::new(QueueState {
                    jobs: VecDeque::new(),
                    draining: false,
                }),
            }),
        }
    }

    /// Pause inserted after every operation
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Operations waiting to start
    pub fn pending(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    /// Whether a drain task is currently active
    pub fn is_draining(&self) -> bool {
        self.inner.lock().draining
    }

    /// Queue `operation` and wait for its output
    ///
    /// The operation's own failures come back inside `T`. A panicking
    /// operation resolves as `HarvestError::QueueClosed`; later operations
    /// still run.
    pub async fn enqueue<F, Fut, T>(&self, operation: F) -> HarvestResult<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let job: Job = Box::new(move || {
            async move {
                let outcome = AssertUnwindSafe(async move { operation().await })
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(value) => {
                        // Caller may have stopped waiting; nothing to do then
                        let _ = tx.send(value);
                    }
                    Err(_) => {
                        tracing::warn!("Queued operation panicked");
                    }
                }
            }
            .boxed()
        });

        let start_drain = {
            let mut state = self.inner.lock();
            state.jobs.push_back(job);
            if state.draining {
                false
            } else {
                state.draining = true;
                true
            }
        };

        if start_drain {
            tracing::debug!("Starting request queue drain");
            tokio::spawn(drain(self.inner.clone()));
        }

        rx.await.map_err(|_| HarvestError::QueueClosed)
    }

    /// `enqueue` for operations that already return `HarvestResult`
    pub async fn run<F, Fut, T>(&self, operation: F) -> HarvestResult<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = HarvestResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.enqueue(operation).await?
    }
}

/// Single drain loop; clears `draining` under the same lock that finds the queue empty
async fn drain(inner: Arc<Inner>) {
    loop {
        let job = {
            let mut state = inner.lock();
            match state.jobs.pop_front() {
                Some(job) => job,
                None => {
                    state.draining = false;
                    return;
                }
            }
        };

        job().await;
        tokio::time::sleep(inner.delay).await;
    }
}
