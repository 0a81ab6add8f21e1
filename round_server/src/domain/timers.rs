// Round-owned deferred tasks with explicit cancellation handles.

use std::sync::Arc;

/// Handle returned by [`TimerQueue::schedule`], keyed by the owning round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerHandle {
    owner: Arc<str>,
    seq: u64,
}

#[derive(Debug)]
struct Scheduled<T> {
    seq: u64,
    due_at_ms: u64,
    task: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    owner: Arc<str>,
    next_seq: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> TimerQueue<T> {
    pub fn new(owner: Arc<str>) -> Self {
        Self {
            owner,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, due_at_ms: u64, task: T) -> TimerHandle {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending.push(Scheduled {
            seq,
            due_at_ms,
            task,
        });
        TimerHandle {
            owner: self.owner.clone(),
            seq,
        }
    }

    /// Cancels a pending task. Handles issued by another queue are ignored.
    pub fn cancel(&mut self, handle: &TimerHandle) -> bool {
        if handle.owner != self.owner {
            return false;
        }
        let before = self.pending.len();
        self.pending.retain(|entry| entry.seq != handle.seq);
        before != self.pending.len()
    }

    /// Removes and returns every task due at `now_ms`, oldest deadline first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|entry| entry.due_at_ms <= now_ms);
        self.pending = pending;
        due.sort_by_key(|entry| (entry.due_at_ms, entry.seq));
        due.into_iter().map(|entry| entry.task).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
