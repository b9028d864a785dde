//! Idle queue and the per-object bookkeeping kept while an object is pooled

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::eviction::EvictionPolicy;

/// Where a pooled object is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryState {
    /// Waiting in the idle queue
    Idle,

    /// Being handed to a borrower
    Allocated,

    /// Selected by an eviction sweep, about to be destroyed
    Evicting,

    /// Rejected by a validation gate, about to be destroyed
    Invalid,
}

/// One pooled object plus the instant it last became idle.
#[derive(Debug)]
pub(crate) struct PooledEntry<T> {
    object: T,
    inserted_at: Instant,
    state: EntryState,
}

impl<T> PooledEntry<T> {
    pub fn new(object: T) -> Self {
        Self {
            object,
            inserted_at: Instant::now(),
            state: EntryState::Idle,
        }
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    pub fn object_mut(&mut self) -> &mut T {
        &mut self.object
    }

    pub fn object(&self) -> &T {
        &self.object
    }

    /// Every entry leaves `Idle` exactly once.
    fn transition(&mut self, next: EntryState) {
        debug_assert_eq!(self.state, EntryState::Idle, "entry already left the idle state");
        self.state = next;
    }

    pub fn allocate(&mut self) {
        self.transition(EntryState::Allocated);
    }

    pub fn invalidate(&mut self) {
        self.transition(EntryState::Invalid);
    }

    pub fn evict(&mut self) {
        self.transition(EntryState::Evicting);
    }

    /// Unwrap the object. The entry must have left `Idle` first, so every
    /// object leaving the pool is accounted as handed out, invalid or evicted.
    pub fn into_object(self) -> T {
        debug_assert_ne!(self.state, EntryState::Idle, "idle entry consumed in place");
        self.object
    }
}

/// FIFO of idle entries. Oldest entries sit at the front.
#[derive(Debug)]
pub(crate) struct IdleQueue<T> {
    entries: VecDeque<PooledEntry<T>>,
}

impl<T> IdleQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_back(&mut self, entry: PooledEntry<T>) {
        debug_assert_eq!(entry.state(), EntryState::Idle);
        self.entries.push_back(entry);
    }

    /// Puts an entry back at the head, keeping its original idle timestamp.
    pub fn push_front(&mut self, entry: PooledEntry<T>) {
        self.entries.push_front(entry);
    }

    pub fn pop_front(&mut self) -> Option<PooledEntry<T>> {
        self.entries.pop_front()
    }

    /// Removes every entry the policy considers expired, scanning from the
    /// front and stopping as soon as only `floor` entries remain.
    ///
    /// The removed objects are returned so the caller can destroy them after
    /// the queue is consistent again.
    pub fn sweep(&mut self, floor: usize, policy: &EvictionPolicy, now: Instant) -> Vec<T> {
        let mut evicted = Vec::new();
        let mut index = 0;

        while index < self.entries.len() && self.entries.len() > floor {
            if policy.is_expired(self.entries[index].idle_for(now)) {
                if let Some(mut entry) = self.entries.remove(index) {
                    entry.evict();
                    evicted.push(entry.into_object());
                }
            } else {
                index += 1;
            }
        }

        evicted
    }

    /// Empty the queue for shutdown. Drained entries count as evicted.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.entries.drain(..).map(|mut entry| {
            entry.evict();
            entry.into_object()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aged(object: u32, age: Duration, now: Instant) -> PooledEntry<u32> {
        PooledEntry {
            object,
            inserted_at: now.checked_sub(age).expect("clock too close to its origin"),
            state: EntryState::Idle,
        }
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue = IdleQueue::new();
        queue.push_back(PooledEntry::new(1));
        queue.push_back(PooledEntry::new(2));

        assert_eq!(queue.pop_front().map(|entry| *entry.object()), Some(1));
        assert_eq!(queue.pop_front().map(|entry| *entry.object()), Some(2));
        assert!(queue.is_empty());
    }

    #[test]
    fn entry_leaves_idle_once() {
        let mut entry = PooledEntry::new(7u32);
        assert_eq!(entry.state(), EntryState::Idle);

        entry.allocate();
        assert_eq!(entry.state(), EntryState::Allocated);
        assert_eq!(entry.into_object(), 7);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "entry already left the idle state")]
    fn invalid_entry_cannot_be_allocated() {
        let mut entry = PooledEntry::new(7u32);
        entry.invalidate();
        entry.allocate();
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "idle entry consumed in place")]
    fn idle_entry_cannot_be_unwrapped() {
        let _ = PooledEntry::new(7u32).into_object();
    }

    #[test]
    fn sweep_respects_floor() {
        let now = Instant::now();
        let mut queue = IdleQueue::new();
        for id in 0..4 {
            queue.push_back(aged(id, Duration::from_secs(60), now));
        }

        let policy = EvictionPolicy::IdleTimeout(Duration::from_secs(10));
        let evicted = queue.sweep(1, &policy, now);

        assert_eq!(evicted, vec![0, 1, 2]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn sweep_skips_fresh_entries() {
        let now = Instant::now();
        let mut queue = IdleQueue::new();
        queue.push_back(aged(1, Duration::from_secs(1), now));
        queue.push_back(aged(2, Duration::from_secs(60), now));
        queue.push_back(aged(3, Duration::from_secs(1), now));

        let policy = EvictionPolicy::IdleTimeout(Duration::from_secs(10));
        let evicted = queue.sweep(0, &policy, now);

        assert_eq!(evicted, vec![2]);
        assert_eq!(queue.drain().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn disabled_policy_evicts_nothing() {
        let now = Instant::now();
        let mut queue = IdleQueue::new();
        queue.push_back(aged(1, Duration::from_secs(120), now));

        assert!(queue.sweep(0, &EvictionPolicy::None, now).is_empty());
        assert_eq!(queue.len(), 1);
    }
}
