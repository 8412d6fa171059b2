//! Completion marker — flips `notificationSent` to `true` after a dispatch attempt.
//!
//! The write is a single-document update and the flag only ever moves from
//! false to true. If the write fails the task stays eligible and the next
//! cycle picks it up again, which can repeat a delivery that already
//! succeeded. Delivery is therefore at-most-once only on a best-effort basis.

use std::sync::Arc;

use taskping_common::error::AppError;
use taskping_common::store::TaskStore;

pub struct CompletionMarker {
    store: Arc<dyn TaskStore>,
}

impl CompletionMarker {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn mark(&self, task_id: &str) -> Result<(), AppError> {
        match self.store.mark_notified(task_id).await {
            Ok(()) => {
                tracing::debug!(todo_id = %task_id, "Marked todo as notified");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    todo_id = %task_id,
                    error = %e,
                    "Failed to mark todo as notified; it stays eligible"
                );
                Err(e)
            }
        }
    }
}
