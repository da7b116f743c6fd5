// Transient messages shown to the user
//
// Produced by the editor, the generation coordinator and autosave; consumed
// by whatever front end holds the other end of the notification channel.

use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Which part of the studio raised the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Story,
    Image,
    Audio,
    Avatar,
    /// Missing or rejected generation credentials
    Auth,
    /// Saving or loading the project record
    Storage,
    /// Rejected edits
    Editor,
}

impl NotificationCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Image => "image",
            Self::Audio => "narration",
            Self::Avatar => "avatar",
            Self::Auth => "credentials",
            Self::Storage => "storage",
            Self::Editor => "editor",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        category: NotificationCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn info(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }

    /// A generation was requested while the session has no usable credentials
    pub fn missing_credentials() -> Self {
        Self::warning(
            NotificationCategory::Auth,
            "Select generation credentials before generating",
        )
    }

    /// The service refused the credentials; the session needs reconfiguring
    pub fn credentials_rejected(detail: impl fmt::Display) -> Self {
        Self::error(
            NotificationCategory::Auth,
            format!("Credentials rejected, select them again: {}", detail),
        )
    }

    /// The project record could not be written
    pub fn save_failed(reason: impl fmt::Display) -> Self {
        Self::error(
            NotificationCategory::Storage,
            format!("Project not saved: {}", reason),
        )
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category.label(), self.message)
    }
}
