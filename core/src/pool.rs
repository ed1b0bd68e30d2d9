//! Bounded pool for per-entity recomputation.
//!
//! At most `concurrency` jobs run at once, each on the blocking thread pool. A job that outlives
//! its timeout is reported as [`JobOutcome::TimedOut`] and its eventual result discarded, but it
//! keeps its permit until the thread actually returns. A panicking job is reported as
//! [`JobOutcome::Failed`] without touching the others.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome<T> {
    Completed(T),
    Failed(String),
    TimedOut,
}

pub struct WorkerPool {
    permits: Arc<Semaphore>,
    concurrency: usize,
    timeout: Duration,
}

impl WorkerPool {
    pub fn new(concurrency: usize, timeout: Duration) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            timeout,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs every job and returns one outcome per job id, in completion order.
    ///
    /// The timeout clock starts once a job holds a permit, not while it queues.
    pub async fn run_all<T, F>(&self, jobs: Vec<(String, F)>) -> Vec<(String, JobOutcome<T>)>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let mut set = JoinSet::new();
        for (id, job) in jobs {
            let permits = self.permits.clone();
            let timeout = self.timeout;
            set.spawn(async move {
                let permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (id, JobOutcome::Failed("worker pool closed".to_string())),
                };
                let work = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    catch_unwind(AssertUnwindSafe(job))
                });
                let outcome = match tokio::time::timeout(timeout, work).await {
                    Ok(Ok(Ok(value))) => JobOutcome::Completed(value),
                    Ok(Ok(Err(panic))) => JobOutcome::Failed(panic_message(panic.as_ref())),
                    Ok(Err(join)) => JobOutcome::Failed(join.to_string()),
                    Err(_) => JobOutcome::TimedOut,
                };
                (id, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(entry) => outcomes.push(entry),
                Err(e) => log::error!("worker task lost: {}", e),
            }
        }
        outcomes
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
