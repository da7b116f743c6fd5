pub mod channels;
pub mod command;
pub mod notification;

pub use channels::{create_editor_channel, create_notification_channel};
pub use command::EditorMessage;
pub use notification::{Notification, NotificationCategory, NotificationLevel};
