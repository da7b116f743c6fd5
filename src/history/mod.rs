// Snapshot history for undo/redo
//
// Unlike a command log, each entry is a complete document. Undo and redo
// only move a cursor; committing after an undo drops the redo branch.

pub mod manager;

pub use manager::{DEFAULT_MAX_HISTORY, History};
