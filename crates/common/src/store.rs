//! Document-store seam used by the scanner and dispatcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::types::{StoredDocument, TaskStatus, User};

/// Candidate query issued by the deadline scanner.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskQuery {
    /// Equality on `status` only.
    ByStatus(TaskStatus),
    /// `status ==`, `from <= dueDate <= to`, `notificationSent != true`.
    DueWindow {
        status: TaskStatus,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

/// Async interface to the task and user collections.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Raw task documents matching the query.
    async fn query_tasks(&self, query: &TaskQuery) -> Result<Vec<StoredDocument>, AppError>;

    /// Point lookup of a user; `None` when the document does not exist.
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Set `notificationSent = true` on a single task document.
    async fn mark_notified(&self, task_id: &str) -> Result<(), AppError>;
}
