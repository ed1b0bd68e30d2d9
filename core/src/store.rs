//! Entity-keyed state with one writer per entity and lock-free-ish reads.
//!
//! Readers clone the published `Arc` and never wait on a writer. Writers serialize per entity
//! through an async mutex, so a slow recomputation for one user never blocks another.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

struct Slot<T> {
    writer: Arc<Mutex<()>>,
    current: RwLock<Option<Arc<T>>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            writer: Arc::new(Mutex::new(())),
            current: RwLock::new(None),
        }
    }

    fn load(&self) -> Option<Arc<T>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub struct EntityStore<T> {
    slots: RwLock<HashMap<String, Arc<Slot<T>>>>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, id: &str) -> Arc<Slot<T>> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
        {
            return slot.clone();
        }
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Slot::new()))
            .clone()
    }

    /// Latest published value.
    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(id).and_then(|slot| slot.load())
    }

    /// Ids with a published value, sorted.
    pub fn ids(&self) -> Vec<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.load().is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the entity's writer lock, waiting for any writer already holding it.
    pub async fn lock(&self, id: &str) -> EntityWriter<T> {
        let slot = self.slot(id);
        let guard = slot.writer.clone().lock_owned().await;
        EntityWriter {
            _guard: guard,
            slot,
        }
    }
}

/// Exclusive write access to one entity. Dropping it releases the lock.
pub struct EntityWriter<T> {
    _guard: OwnedMutexGuard<()>,
    slot: Arc<Slot<T>>,
}

impl<T> EntityWriter<T> {
    pub fn current(&self) -> Option<Arc<T>> {
        self.slot.load()
    }

    /// Replaces the published value; readers holding the old `Arc` keep it.
    pub fn publish(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        *self
            .slot
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(value.clone());
        value
    }
}
