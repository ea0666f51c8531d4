use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A unit of work: handling one connection.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// How a shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Every worker finished within the grace period.
    Graceful,
    /// The grace period ran out and the remaining workers were cancelled.
    Forced,
}

#[derive(Debug)]
pub struct PoolClosed;

impl std::fmt::Display for PoolClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("worker pool is shut down")
    }
}

impl std::error::Error for PoolClosed {}

/// Fixed number of workers pulling jobs from one bounded queue.
///
/// Submitting waits while the queue is full; nothing is rejected.
pub struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    workers: JoinSet<()>,
    grace: Duration,
}

impl WorkerPool {
    /// # Panics
    ///
    /// Panics if `size` or `queue_size` is zero, or outside a tokio runtime.
    pub fn new(size: usize, queue_size: usize, grace: Duration) -> Self {
        assert!(size > 0, "worker pool needs at least one worker");

        let (sender, receiver) = mpsc::channel::<Job>(queue_size);
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = JoinSet::new();
        for id in 0..size {
            let receiver = Arc::clone(&receiver);
            workers.spawn(async move {
                loop {
                    // the lock is released before the job runs
                    let job = receiver.lock().await.recv().await;
                    match job {
                        Some(job) => job.await,
                        None => {
                            debug!(worker = id, "queue closed, worker exiting");
                            break;
                        }
                    }
                }
            });
        }

        Self {
            sender: Some(sender),
            workers,
            grace,
        }
    }

    pub async fn submit(&self, job: Job) -> Result<(), PoolClosed> {
        match &self.sender {
            Some(sender) => sender.send(job).await.map_err(|_| PoolClosed),
            None => Err(PoolClosed),
        }
    }

    /// Stops taking work, waits up to the grace period for queued and
    /// running jobs, then cancels whatever is left.
    pub async fn shutdown(mut self) -> Drain {
        // closing the queue lets idle workers exit once it is empty
        self.sender.take();

        let grace = self.grace;
        let workers = &mut self.workers;
        let drained = tokio::time::timeout(grace, async {
            while workers.join_next().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => {
                info!("worker pool drained");
                Drain::Graceful
            }
            Err(_) => {
                warn!(
                    remaining = self.workers.len(),
                    "grace period over, cancelling connections"
                );
                self.workers.abort_all();
                while self.workers.join_next().await.is_some() {}
                Drain::Forced
            }
        }
    }
}
