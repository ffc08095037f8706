//! Delayed turn-off timers, at most one per entity.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::info;
use uuid::Uuid;

use crate::runtime::{self, JoinHandle, lock};

#[derive(Debug)]
struct OffTimer {
    id: Uuid,
    handle: JoinHandle<()>,
}

/// Pending off-timers keyed by entity id.
///
/// Starting a timer for an entity replaces the one already running. Each
/// timer carries a generation id, so a timer that fires just as it is
/// replaced never removes its successor.
#[derive(Debug, Clone, Default)]
pub struct OffTimers {
    timers: Arc<Mutex<HashMap<String, OffTimer>>>,
}

impl OffTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` after `delay` unless cancelled first. Must be called from
    /// inside a tokio runtime.
    pub fn start<F>(&self, entity_id: &str, delay: Duration, job: F) -> Uuid
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let timers = self.clone();
        let key = entity_id.to_string();

        let mut map = lock(&self.timers);
        let handle = runtime::spawn(async move {
            runtime::sleep(delay).await;
            if timers.finish(&key, id) {
                info!("Fire timer: {}", key);
                job.await;
            }
        });
        info!("Start timer: {} ({:.1} seconds)", entity_id, delay.as_secs_f64());
        if let Some(previous) = map.insert(entity_id.to_string(), OffTimer { id, handle }) {
            info!("Cancel timer: {}", entity_id);
            previous.handle.abort();
        }
        id
    }

    /// Cancel the entity's timer. Returns `true` if one was pending.
    pub fn cancel(&self, entity_id: &str) -> bool {
        match lock(&self.timers).remove(entity_id) {
            Some(timer) => {
                info!("Cancel timer: {}", entity_id);
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<(String, OffTimer)> = lock(&self.timers).drain().collect();
        for (entity_id, timer) in &drained {
            info!("Cancel timer: {}", entity_id);
            timer.handle.abort();
        }
        drained.len()
    }

    pub fn is_pending(&self, entity_id: &str) -> bool {
        lock(&self.timers).contains_key(entity_id)
    }

    /// Generation id of the entity's pending timer.
    pub fn pending_id(&self, entity_id: &str) -> Option<Uuid> {
        lock(&self.timers).get(entity_id).map(|t| t.id)
    }

    pub fn len(&self) -> usize {
        lock(&self.timers).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.timers).is_empty()
    }

    /// Remove a fired timer if it is still the current one for the entity.
    fn finish(&self, entity_id: &str, id: Uuid) -> bool {
        let mut map = lock(&self.timers);
        if map.get(entity_id).is_some_and(|t| t.id == id) {
            map.remove(entity_id);
            true
        } else {
            false
        }
    }
}
