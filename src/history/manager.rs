use std::collections::VecDeque;

use crate::document::model::Document;
use crate::foundation::error::{CoverError, CoverResult};

/// Capacity used when neither the caller nor the environment picks one.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Environment variable read by [`HistoryManager::new`].
pub const HISTORY_CAPACITY_ENV: &str = "COVERFORGE_HISTORY_CAPACITY";

/// One immutable serialized document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistorySnapshot {
    seq: u64,
    json: String,
}

impl HistorySnapshot {
    /// Monotonic index assigned when the snapshot was taken.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Document JSON.
    pub fn json(&self) -> &str {
        &self.json
    }

    fn decode(&self) -> CoverResult<Document> {
        let doc: Document = serde_json::from_str(&self.json).map_err(|err| {
            CoverError::serde(format!("history snapshot {} is unreadable: {err}", self.seq))
        })?;
        Ok(doc)
    }
}

/// Bounded linear undo/redo stack of document snapshots.
///
/// `cursor` points at the snapshot matching the live document. Taking a snapshot while the cursor
/// is behind the newest entry drops the redo branch; overflowing the capacity evicts the oldest.
#[derive(Clone, Debug)]
pub struct HistoryManager {
    snapshots: VecDeque<HistorySnapshot>,
    cursor: usize,
    capacity: usize,
    next_seq: u64,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    /// Manager sized from `COVERFORGE_HISTORY_CAPACITY`, falling back to 50.
    pub fn new() -> Self {
        let capacity = std::env::var(HISTORY_CAPACITY_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_HISTORY_CAPACITY);
        Self::with_capacity(capacity)
    }

    /// Manager holding at most `capacity` snapshots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity.min(256)),
            cursor: 0,
            capacity,
            next_seq: 0,
        }
    }

    /// Record `document` as the newest state.
    pub fn snapshot(&mut self, document: &Document) -> CoverResult<()> {
        let json = document.to_json()?;

        if !self.snapshots.is_empty() && self.cursor + 1 < self.snapshots.len() {
            let dropped = self.snapshots.len() - (self.cursor + 1);
            self.snapshots.truncate(self.cursor + 1);
            tracing::debug!(dropped, "history redo branch discarded");
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.snapshots.push_back(HistorySnapshot { seq, json });
        self.cursor = self.snapshots.len() - 1;

        if self.snapshots.len() > self.capacity {
            if let Some(evicted) = self.snapshots.pop_front() {
                tracing::debug!(seq = evicted.seq, "history snapshot evicted");
            }
            self.cursor -= 1;
        }
        tracing::debug!(seq, cursor = self.cursor, len = self.snapshots.len(), "history snapshot");
        Ok(())
    }

    /// Step back one snapshot; `Ok(None)` at the oldest one.
    pub fn undo(&mut self) -> CoverResult<Option<Document>> {
        if !self.can_undo() {
            return Ok(None);
        }
        let target = self.cursor - 1;
        let doc = self.snapshots[target].decode()?;
        self.cursor = target;
        tracing::debug!(cursor = self.cursor, "history undo");
        Ok(Some(doc))
    }

    /// Step forward one snapshot; `Ok(None)` at the newest one.
    pub fn redo(&mut self) -> CoverResult<Option<Document>> {
        if !self.can_redo() {
            return Ok(None);
        }
        let target = self.cursor + 1;
        let doc = self.snapshots[target].decode()?;
        self.cursor = target;
        tracing::debug!(cursor = self.cursor, "history redo");
        Ok(Some(doc))
    }

    /// True when an older snapshot exists.
    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor > 0
    }

    /// True when a newer snapshot exists.
    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor + 1 < self.snapshots.len()
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True before the first snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the current snapshot; 0 when empty.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Maximum number of retained snapshots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot under the cursor.
    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.snapshots.get(self.cursor)
    }

    /// Snapshots oldest first.
    pub fn snapshots(&self) -> impl Iterator<Item = &HistorySnapshot> {
        self.snapshots.iter()
    }

    /// Drop every snapshot. Sequence numbers keep increasing.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
        tracing::debug!("history cleared");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/manager.rs"]
mod tests;
