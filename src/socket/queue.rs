//! Ordered send queue.
//!
//! A FIFO of work items bound to one connection. Items run one at a time,
//! strictly in enqueue order, on a single drain task that exists only while
//! there is work.
//!
//! # Drain Model
//!
//! ```text
//! enqueue ──► [ job | job | job ] ──► drain task ──► job().await ──► handle
//!                 pending              (one at a time)
//! ```
//!
//! The first enqueue onto an idle queue sets `draining` and spawns the drain
//! task. The task pops and awaits jobs until `pending` is empty, then clears
//! `draining` under the same lock and exits.
//!
//! A failed or panicking job only affects its own [`QueuedTask`]. The queue
//! itself never logs or swallows results.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Type-erased unit of work. Resolves its own handle when run.
type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// State shared between enqueuers and the drain task.
#[derive(Default)]
struct QueueState {
    /// Work not yet started.
    pending: VecDeque<Job>,
    /// A drain task is running.
    draining: bool,
    /// No further work is accepted.
    closed: bool,
}

// ============================================================================
// QueuedTask
// ============================================================================

/// Handle to one enqueued work item.
///
/// Resolves with that item's own result once it has run. Dropping the
/// handle does not withdraw the item.
#[must_use = "the work runs regardless; await the task to observe its result"]
pub struct QueuedTask<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> QueuedTask<T> {
    /// Creates a handle that is already resolved.
    pub(crate) fn ready(result: Result<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }
}

impl<T> Future for QueuedTask<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the item was refused or the runtime went away.
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(Error::QueueClosed)))
    }
}

// ============================================================================
// SendQueue
// ============================================================================

/// FIFO work queue that runs one item at a time.
///
/// The drain task is spawned onto the current tokio runtime. Enqueueing from
/// outside a runtime is refused with [`Error::RuntimeUnavailable`].
#[derive(Clone, Default)]
pub struct SendQueue {
    state: Arc<Mutex<QueueState>>,
}

impl SendQueue {
    /// Creates an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `work`, to be called with `context` once every earlier item
    /// has completed.
    ///
    /// Ordering is fixed when this method returns, not when the returned
    /// task is first polled.
    ///
    /// # Errors
    ///
    /// The returned task resolves with:
    ///
    /// - [`Error::QueueClosed`] if the queue was closed before this call
    /// - [`Error::RuntimeUnavailable`] if there is no tokio runtime to drain on
    /// - [`Error::TaskPanicked`] if `work` panicked
    /// - whatever error `work` itself returned
    pub fn enqueue<C, T, F, Fut>(&self, work: F, context: C) -> QueuedTask<T>
    where
        C: Send + 'static,
        T: Send + 'static,
        F: FnOnce(C) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            return QueuedTask::ready(Err(Error::RuntimeUnavailable));
        };

        let (tx, rx) = oneshot::channel();

        let job: Job = Box::new(move || {
            async move {
                let result = AssertUnwindSafe(async move { work(context).await })
                    .catch_unwind()
                    .await
                    .unwrap_or(Err(Error::TaskPanicked));
                let _ = tx.send(result);
            }
            .boxed()
        });

        let start_drain = {
            let mut state = self.state.lock();
            if state.closed {
                // Dropping the job drops `tx`, which resolves the task with QueueClosed.
                return QueuedTask { rx };
            }
            state.pending.push_back(job);
            !std::mem::replace(&mut state.draining, true)
        };

        if start_drain {
            runtime.spawn(Self::drain(Arc::clone(&self.state)));
        }

        QueuedTask { rx }
    }

    /// Stops accepting work. Items already queued still run.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns `true` while a drain task is running.
    #[inline]
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.state.lock().draining
    }

    /// Returns the number of items waiting to start.
    ///
    /// The item currently running is not counted.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Runs queued jobs one by one until the queue is empty.
    async fn drain(state: Arc<Mutex<QueueState>>) {
        loop {
            let job = {
                let mut state = state.lock();
                match state.pending.pop_front() {
                    Some(job) => job,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };

            job().await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
