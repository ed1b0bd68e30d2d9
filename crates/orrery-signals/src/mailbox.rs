use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;

/// Bounded single-consumer mailbox that never blocks the sender.
///
/// When full, the oldest undelivered item is discarded to make room for the newest. Suited to
/// state streams where only the latest value matters.
#[derive(Debug)]
struct Mailbox<T> {
    queue: Mutex<VecDeque<T>>,
    capacity: usize,
    notify: Notify,
    closed: AtomicBool,
    senders: AtomicUsize,
    dropped: AtomicU64,
}

impl<T> Mailbox<T> {
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MailboxError<T> {
    #[error("mailbox closed")]
    Closed(T),
}

/// Outcome of a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// The oldest queued item was discarded to make room
    DisplacedOldest,
}

/// Producer side. Cloneable; the mailbox closes when the last sender is dropped.
#[derive(Debug)]
pub struct MailboxSender<T> {
    inner: Arc<Mailbox<T>>,
}

impl<T> MailboxSender<T> {
    /// Enqueues without blocking, evicting the oldest item when full.
    pub fn try_send(&self, item: T) -> Result<Delivery, MailboxError<T>> {
        if self.inner.is_closed() {
            return Err(MailboxError::Closed(item));
        }
        let delivery = {
            let mut queue = self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner);
            let delivery = if queue.len() >= self.inner.capacity {
                queue.pop_front();
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                Delivery::DisplacedOldest
            } else {
                Delivery::Queued
            };
            queue.push_back(item);
            delivery
        };
        self.inner.notify.notify_one();
        Ok(delivery)
    }

    /// Whether the receiver has gone away.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Clone for MailboxSender<T> {
    fn clone(&self) -> Self {
        self.inner.senders.fetch_add(1, Ordering::SeqCst);
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Drop for MailboxSender<T> {
    fn drop(&mut self) {
        if self.inner.senders.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.close();
        }
    }
}

/// Consumer side. Dropping it closes the mailbox.
#[derive(Debug)]
pub struct MailboxReceiver<T> {
    inner: Arc<Mailbox<T>>,
}

impl<T> MailboxReceiver<T> {
    pub fn try_recv(&self) -> Option<T> {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Waits for the next item. `None` once the mailbox is closed and drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            let notified = self.inner.notify.notified();
            if let Some(item) = self.try_recv() {
                return Some(item);
            }
            if self.inner.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    /// Discards everything queued except the newest item and returns it.
    pub fn latest(&self) -> Option<T> {
        let mut queue = self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let newest = queue.pop_back();
        queue.clear();
        newest
    }

    /// Items evicted so far because the mailbox was full.
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl<T> Drop for MailboxReceiver<T> {
    fn drop(&mut self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}

/// Creates a mailbox holding at most `capacity` items (at least one).
pub fn channel<T>(capacity: usize) -> (MailboxSender<T>, MailboxReceiver<T>) {
    let inner = Arc::new(Mailbox {
        queue: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        capacity: capacity.max(1),
        notify: Notify::new(),
        closed: AtomicBool::new(false),
        senders: AtomicUsize::new(1),
        dropped: AtomicU64::new(0),
    });
    (
        MailboxSender {
            inner: inner.clone(),
        },
        MailboxReceiver { inner },
    )
}
