use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Focus,
    Break,
    Event,
}

impl Category {
    /// Category of the notification announcing that `completed` ended.
    pub fn for_completed(completed: Mode) -> Self {
        if completed.is_break() {
            Category::Break
        } else {
            Category::Focus
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Focus => "focus",
            Category::Break => "break",
            Category::Event => "event",
        }
    }

    /// Headline shown by OS notifications and the remote service.
    pub fn title(self) -> &'static str {
        match self {
            Category::Focus => "Pomodoro complete!",
            Category::Break => "Break ended",
            Category::Event => "EduSync",
        }
    }
}

/// Bilingual message body: English primary, Arabic secondary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub category: Category,
    pub message: Message,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl NotificationRecord {
    pub fn new(category: Category, message: Message, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            message,
            created_at,
            read: false,
        }
    }

    pub fn title(&self) -> &'static str {
        self.category.title()
    }

    /// Both languages, one per line.
    pub fn body(&self) -> String {
        format!("{}\n{}", self.message.primary, self.message.secondary)
    }
}
