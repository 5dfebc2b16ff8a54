//! Event and session stores
//!
//! Two ordered containers with a load-bearing ordering contract: newest entry
//! first, insertion always at the front. The symptom log is additionally
//! bounded, and its head element drives the debouncer.

use crate::types::{ExerciseSession, SymptomEvent};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Bounded most-recent-first log of accepted symptom events for one kind.
///
/// Insertions beyond capacity silently discard the oldest entries. The
/// session counters track totals independently, so truncation never loses
/// counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomLog {
    entries: VecDeque<SymptomEvent>,
    capacity: usize,
}

impl SymptomLog {
    /// Create an empty log holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert an event at the front, discarding the oldest beyond capacity
    pub fn push(&mut self, event: SymptomEvent) {
        self.entries.push_front(event);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// The most recently accepted event, if any
    pub fn latest(&self) -> Option<&SymptomEvent> {
        self.entries.front()
    }

    /// Entries newest-first
    pub fn iter(&self) -> impl Iterator<Item = &SymptomEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries, keeping the capacity
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Unbounded most-recent-first list of completed session summaries.
/// In-memory only; lives for the process lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionHistory {
    sessions: Vec<ExerciseSession>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a completed session summary
    pub fn record(&mut self, session: ExerciseSession) {
        self.sessions.insert(0, session);
    }

    /// The most recently completed session, if any
    pub fn latest(&self) -> Option<&ExerciseSession> {
        self.sessions.first()
    }

    /// Sessions newest-first
    pub fn sessions(&self) -> &[ExerciseSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
