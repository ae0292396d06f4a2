use chrono::{DateTime, Utc};

/// A single task as shown in a user's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a todo that has not been completed yet.
    pub fn new(id: String, title: String, created_at: DateTime<Utc>) -> Self {
        Todo {
            id,
            title,
            completed: false,
            created_at,
        }
    }
}
