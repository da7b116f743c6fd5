// Editor - serialized update path over the document history
//
// Architecture:
// - EditAction: one variant per user edit, applied to a copy of the current snapshot
// - EditorState: owns the History plus transient session fields
// - EditorMessage queue: edits from anywhere are drained in order by the editor

pub mod action;
pub mod state;

pub use action::{EditAction, EditError, EditResult};
pub use state::{EditorState, SessionStatus};
