//! Drives [`AstroRuntime::tick`] on a fixed period until shut down.

use crate::runtime::AstroRuntime;
use chrono::Utc;
use orrery_config::SchedulerConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use urania::EphemerisProvider;

/// Exponential retry delay, doubling from `initial` up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            next: initial,
        }
    }

    /// Delay to wait now; the following call returns twice as much, up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}

pub struct Scheduler<P> {
    runtime: Arc<AstroRuntime<P>>,
    period: Duration,
    backoff: Backoff,
}

impl<P: EphemerisProvider + 'static> Scheduler<P> {
    pub fn new(runtime: Arc<AstroRuntime<P>>, config: &SchedulerConfig) -> Self {
        Self::with_timing(
            runtime,
            config.tick_period(),
            config.backoff_initial(),
            config.backoff_max(),
        )
    }

    /// Retries never wait longer than one period.
    pub fn with_timing(
        runtime: Arc<AstroRuntime<P>>,
        period: Duration,
        backoff_initial: Duration,
        backoff_max: Duration,
    ) -> Self {
        let initial = backoff_initial.min(period);
        Self {
            runtime,
            period,
            backoff: Backoff::new(initial, backoff_max.min(period)),
        }
    }

    /// Starts ticking immediately on the current tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let ticks = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(self.run(shutdown_rx, ticks.clone()));
        SchedulerHandle {
            task,
            shutdown_tx,
            ticks,
        }
    }

    async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>, ticks: Arc<AtomicU64>) {
        log::info!("scheduler started, period {:?}", self.period);
        loop {
            let delay = match self.runtime.tick(Utc::now()).await {
                Ok(_) => {
                    self.backoff.reset();
                    self.period
                }
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    log::warn!("tick failed ({}); retrying in {:?}", e, delay);
                    delay
                }
            };
            ticks.fetch_add(1, Ordering::SeqCst);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.recv() => {
                    log::info!("scheduler received shutdown signal");
                    break;
                }
            }
        }
    }
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    task: JoinHandle<()>,
    shutdown_tx: mpsc::Sender<()>,
    ticks: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Ticks attempted so far, failed ones included.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Stops after the tick in progress, if any, and waits for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.try_send(());
        if let Err(e) = self.task.await {
            log::error!("scheduler task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_to_cap() {
        let mut backoff = Backoff::new(Duration::from_secs(30), Duration::from_secs(100));
        assert_eq!(backoff.next_delay(), Duration::from_secs(30));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));
        assert_eq!(backoff.next_delay(), Duration::from_secs(100));
        assert_eq!(backoff.next_delay(), Duration::from_secs(100));
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(30));
    }
}
