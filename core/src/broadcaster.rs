//! Per-entity pub/sub. The last published message wins and is replayed to new subscribers.

use orrery_signals::{channel, Delivery, EntityKey, MailboxError, MailboxReceiver, MailboxSender, StateMessage};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// A subscriber's end of one topic. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    key: EntityKey,
    receiver: MailboxReceiver<StateMessage>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub async fn recv(&self) -> Option<StateMessage> {
        self.receiver.recv().await
    }

    pub fn try_recv(&self) -> Option<StateMessage> {
        self.receiver.try_recv()
    }

    /// Skips to the newest undelivered message.
    pub fn latest(&self) -> Option<StateMessage> {
        self.receiver.latest()
    }

    /// Messages lost to a full mailbox.
    pub fn dropped(&self) -> u64 {
        self.receiver.dropped()
    }
}

#[derive(Default)]
struct Topic {
    latest: Option<StateMessage>,
    subscribers: Vec<(Uuid, MailboxSender<StateMessage>)>,
}

pub struct StateBroadcaster {
    capacity: usize,
    topics: Mutex<HashMap<EntityKey, Topic>>,
}

impl StateBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, key: EntityKey) -> Subscription {
        let (sender, receiver) = channel(self.capacity);
        let id = Uuid::new_v4();
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let topic = topics.entry(key.clone()).or_default();
        if let Some(latest) = &topic.latest {
            let _ = sender.try_send(latest.clone());
        }
        topic.subscribers.push((id, sender));
        log::debug!("subscriber {} joined {}", id, key);
        Subscription { id, key, receiver }
    }

    /// Delivers `message` to every live subscriber of its entity without waiting on any of them.
    /// Returns how many subscribers received it.
    pub fn publish(&self, message: StateMessage) -> usize {
        let key = message.key();
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let topic = topics.entry(key.clone()).or_default();

        let mut delivered = 0;
        topic.subscribers.retain(|(id, sender)| match sender.try_send(message.clone()) {
            Ok(Delivery::Queued) => {
                delivered += 1;
                true
            }
            Ok(Delivery::DisplacedOldest) => {
                log::debug!("subscriber {} on {} is behind; dropped its oldest message", id, key);
                delivered += 1;
                true
            }
            Err(MailboxError::Closed(_)) => {
                log::debug!("pruning closed subscriber {} on {}", id, key);
                false
            }
        });
        topic.latest = Some(message);
        delivered
    }

    pub fn latest(&self, key: &EntityKey) -> Option<StateMessage> {
        let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics.get(key).and_then(|topic| topic.latest.clone())
    }

    /// Live subscribers of `key`, pruning closed ones first.
    pub fn subscriber_count(&self, key: &EntityKey) -> usize {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        match topics.get_mut(key) {
            Some(topic) => {
                topic.subscribers.retain(|(_, sender)| !sender.is_closed());
                topic.subscribers.len()
            }
            None => 0,
        }
    }
}
