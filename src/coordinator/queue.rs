// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Single-flight FIFO work queue.
//!
//! An item can be pending at most once. The pending mark is removed when
//! the item is dequeued, not when processing finishes, so a change that
//! arrives while the worker is busy with a file can queue that file again.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct QueueState<T> {
    pending: HashSet<T>,
    fifo: VecDeque<T>,
}

impl<T: Eq + Hash + Clone> QueueState<T> {
    fn pop(&mut self) -> Option<T> {
        let item = self.fifo.pop_front()?;
        self.pending.remove(&item);
        Some(item)
    }
}

/// A blocking FIFO that refuses duplicates of pending items.
pub struct DedupQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

impl<T: Eq + Hash + Clone> Default for DedupQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> DedupQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: HashSet::new(),
                fifo: VecDeque::new(),
            }),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` unless it is already pending.
    ///
    /// Returns `false`, leaving the queue untouched, for a duplicate.
    pub fn try_enqueue(&self, item: T) -> bool {
        let mut state = self.lock();
        if state.pending.contains(&item) {
            return false;
        }
        state.pending.insert(item.clone());
        state.fifo.push_back(item);
        drop(state);

        self.available.notify_one();
        true
    }

    /// Removes and returns the oldest item, blocking until one exists.
    pub fn dequeue(&self) -> T {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.pop() {
                return item;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`dequeue`](Self::dequeue), but gives up after `timeout`.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if let Some(item) = state.pop() {
                return Some(item);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            if remaining.is_zero() {
                return None;
            }
            state = self
                .available
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Whether `item` is waiting in the queue.
    pub fn is_pending(&self, item: &T) -> bool {
        self.lock().pending.contains(item)
    }

    /// Number of waiting items.
    pub fn len(&self) -> usize {
        self.lock().fifo.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().fifo.is_empty()
    }
}
