//! In-process publish/subscribe for UI signals.
//!
//! A [`Feed`] fans every published value out to all live subscribers. A
//! [`Subscription`] owns its receiving end and deregisters itself when
//! dropped, so a component that holds one cannot outlive its registration.

use std::sync::{Arc, Mutex, Weak};

use flume::{Receiver, Sender};
use log::{debug, warn};

struct Registry<T> {
    next_id: u64,
    subscribers: Vec<(u64, Sender<T>)>,
}

pub struct Feed<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: Clone> Default for Feed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Feed<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn publish(&self, signal: T) {
        let Ok(registry) = self.registry.lock() else {
            warn!("Feed registry poisoned, dropping signal");
            return;
        };
        for (_, tx) in &registry.subscribers {
            let _ = tx.send(signal.clone());
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = flume::unbounded();
        let id = match self.registry.lock() {
            Ok(mut registry) => {
                let id = registry.next_id;
                registry.next_id += 1;
                registry.subscribers.push((id, tx));
                id
            }
            Err(_) => {
                warn!("Feed registry poisoned, subscription will stay silent");
                u64::MAX
            }
        };
        debug!("Feed subscriber {id} registered");
        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .map(|r| r.subscribers.len())
            .unwrap_or(0)
    }
}

pub struct Subscription<T> {
    id: u64,
    rx: Receiver<T>,
    registry: Weak<Mutex<Registry<T>>>,
}

impl<T> Subscription<T> {
    pub fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    pub fn try_next(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if let Ok(mut registry) = registry.lock() {
            registry.subscribers.retain(|(id, _)| *id != self.id);
            debug!("Feed subscriber {} released", self.id);
        }
    }
}
