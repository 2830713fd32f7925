//! Deadline-ordered delayed continuations.
//!
//! Nothing here runs on its own: the owner calls [`TimerQueue::pop_due`] whenever its clock
//! advances and decides what a fired payload means. Payloads carry whatever generation token the
//! owner needs to recognise a stale timer.

use std::{cmp::Ordering, collections::BinaryHeap};

#[derive(Debug)]
struct Entry<T> {
    due_ms: u64,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// min-heap on (due, seq): earliest deadline first, insertion order breaks ties
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            due_ms: now_ms.saturating_add(delay_ms),
            seq,
            payload,
        });
    }

    /// Next payload whose deadline is at or before `now_ms`, together with that deadline.
    ///
    /// A timer popped late still reports its own deadline; follow-up work should be scheduled
    /// from it rather than from `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, T)> {
        if self.next_due()? <= now_ms {
            self.heap.pop().map(|e| (e.due_ms, e.payload))
        } else {
            None
        }
    }

    /// Earliest pending deadline.
    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|e| e.due_ms)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
