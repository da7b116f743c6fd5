// Messages accepted by the editor's serialized update path

use crate::editor::action::EditAction;

#[derive(Debug, Clone)]
pub enum EditorMessage {
    Edit(EditAction),
    Undo,
    Redo,
    /// Credentials were selected again after an authentication failure
    Reconfigure,
}
