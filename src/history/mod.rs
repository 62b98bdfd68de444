//! Snapshot-based undo/redo.

pub mod manager;
