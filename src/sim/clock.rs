//! Virtual clock and cancellable timer queue
//!
//! Stands in for the host's `setTimeout`/`setInterval`: callbacks are plain
//! values that come back out of [`TimerQueue::pop_due`] in fire order, and
//! the caller dispatches them one at a time. Nothing here runs concurrently.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use super::target::TargetId;

/// Handle to a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Wake-ups the round engine schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Spawn scheduler beat (first, second or repeating)
    Spawn,
    /// Target lifetime elapsed
    Expire(TargetId),
    /// Hit target finished its settle animation
    Settle(TargetId),
    /// Round countdown refresh
    CountdownTick,
    /// Round end backstop
    Deadline,
}

#[derive(Debug, Clone)]
struct Entry<E> {
    fire_at: u64,
    period: Option<u64>,
    event: E,
}

/// Deterministic timer queue keyed by (fire time, scheduling order)
#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    now_ms: u64,
    next_id: u64,
    next_seq: u64,
    entries: BTreeMap<TimerId, Entry<E>>,
    heap: BinaryHeap<Reverse<(u64, u64, TimerId)>>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            next_seq: 0,
            entries: BTreeMap::new(),
            heap: BinaryHeap::new(),
        }
    }

    /// Current virtual time (ms)
    #[inline]
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Number of pending callbacks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Fire `event` once, `delay_ms` from now
    pub fn schedule_in(&mut self, delay_ms: u64, event: E) -> TimerId {
        let fire_at = self.now_ms + delay_ms;
        self.insert(fire_at, None, event)
    }

    /// Fire `event` every `period_ms`, starting `first_delay_ms` from now
    pub fn schedule_every(&mut self, first_delay_ms: u64, period_ms: u64, event: E) -> TimerId {
        let fire_at = self.now_ms + first_delay_ms;
        // A zero period would never let the clock move on
        self.insert(fire_at, Some(period_ms.max(1)), event)
    }

    /// Cancel a pending callback. Unknown or already-fired ids are ignored.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drop every pending callback
    pub fn clear(&mut self) {
        self.entries.clear();
        self.heap.clear();
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn insert(&mut self, fire_at: u64, period: Option<u64>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            Entry {
                fire_at,
                period,
                event,
            },
        );
        self.push_heap(fire_at, id);
        id
    }

    fn push_heap(&mut self, fire_at: u64, id: TimerId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((fire_at, seq, id)));
    }
}

impl<E: Clone> TimerQueue<E> {
    /// Pop the earliest callback due at or before `until_ms`
    ///
    /// The clock jumps to the callback's fire time. Repeating callbacks are
    /// re-armed one period later before being returned, so the handler may
    /// cancel them.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, E)> {
        loop {
            let Reverse((fire_at, _, id)) = *self.heap.peek()?;
            if fire_at > until_ms {
                return None;
            }
            self.heap.pop();

            // Cancelled (or re-armed) entries leave stale heap records behind
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            if entry.fire_at != fire_at {
                continue;
            }

            let event = entry.event.clone();
            let period = entry.period;
            if let Some(period) = period {
                entry.fire_at = fire_at + period;
            }

            self.now_ms = self.now_ms.max(fire_at);
            match period {
                Some(period) => {
                    self.push_heap(fire_at + period, id);
                }
                None => {
                    self.entries.remove(&id);
                }
            }
            return Some((id, event));
        }
    }
}
