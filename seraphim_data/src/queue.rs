use parking_lot::Mutex;
use std::{
    collections::{HashSet, VecDeque},
    hash::Hash,
};
use tokio::sync::Notify;

/// A FIFO queue that ignores items it already holds.
///
/// An item stays "known" after it is taken until [`SetQueue::remove_from_copy`] is called,
/// so a consumer decides when the same item may be queued again.
pub struct SetQueue<T> {
    inner: Mutex<Inner<T>>,
    notify: Notify,
}

struct Inner<T> {
    queue: VecDeque<T>,
    known: HashSet<T>,
}

impl<T: Clone + Eq + Hash> SetQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        SetQueue {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                known: HashSet::new(),
            }),
            notify: Notify::new(),
        }
    }

    /// Returns false if the item was already known.
    pub fn put(&self, item: T) -> bool {
        {
            let mut inner = self.inner.lock();
            if !inner.known.insert(item.clone()) {
                return false;
            }
            inner.queue.push_back(item);
        }

        self.notify.notify_one();
        true
    }

    /// Waits for the oldest item.
    pub async fn get(&self) -> T {
        loop {
            if let Some(item) = self.try_get() {
                return item;
            }
            self.notify.notified().await;
        }
    }

    pub fn try_get(&self) -> Option<T> {
        self.inner.lock().queue.pop_front()
    }

    pub fn remove_from_copy(&self, item: &T) {
        self.inner.lock().known.remove(item);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Eq + Hash> Default for SetQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
