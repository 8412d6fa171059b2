//! Deadline scanner — selects tasks whose due time falls in the upcoming window.
//!
//! Eligibility: `status == "todo"`, `notificationSent != true` and
//! `from <= dueDate <= to`, where `from = now - grace` and `to = now + window`.
//! Both bounds are inclusive.
//!
//! Two query strategies exist because some document stores reject or
//! mis-evaluate a range filter combined with a negated boolean filter:
//! - `Narrow` asks the store for every `todo` task and evaluates the window
//!   and the flag here, after normalizing each due date.
//! - `Precise` pushes the whole predicate into the store query.
//!
//! Whatever the store returns is re-checked against the predicate either way.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use taskping_common::config::ScanConfig;
use taskping_common::error::AppError;
use taskping_common::store::{TaskQuery, TaskStore};
use taskping_common::types::{ScanStrategy, Task, TaskStatus};

/// Inclusive due-date window of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ScanWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }
}

pub struct DeadlineScanner {
    store: Arc<dyn TaskStore>,
    config: ScanConfig,
}

impl DeadlineScanner {
    pub fn new(store: Arc<dyn TaskStore>, config: ScanConfig) -> Self {
        Self { store, config }
    }

    /// Window at `now`. Bounds that cannot be represented, or a window that
    /// would end before it starts, are configuration errors.
    pub fn window(&self, now: DateTime<Utc>) -> Result<ScanWindow, AppError> {
        let grace = Duration::try_seconds(self.config.grace_seconds);
        let ahead = Duration::try_minutes(self.config.window_minutes);

        let from = grace.and_then(|d| now.checked_sub_signed(d));
        let to = ahead.and_then(|d| now.checked_add_signed(d));

        match (from, to) {
            (Some(from), Some(to)) if from <= to => Ok(ScanWindow { from, to }),
            _ => Err(AppError::Config(format!(
                "unusable scan window: window_minutes={}, grace_seconds={}",
                self.config.window_minutes, self.config.grace_seconds
            ))),
        }
    }

    /// Full eligibility predicate over a normalized task.
    pub fn is_eligible(task: &Task, window: &ScanWindow) -> bool {
        task.status == TaskStatus::Todo && !task.notification_sent && window.contains(task.due_date)
    }

    /// Return every eligible task at `now`.
    ///
    /// A failed store query aborts the scan. Documents whose due date cannot
    /// be normalized are logged and left out.
    pub async fn scan(&self, now: DateTime<Utc>) -> Result<Vec<Task>, AppError> {
        let window = self.window(now)?;
        let query = match self.config.strategy {
            ScanStrategy::Narrow => TaskQuery::ByStatus(TaskStatus::Todo),
            ScanStrategy::Precise => TaskQuery::DueWindow {
                status: TaskStatus::Todo,
                from: window.from,
                to: window.to,
            },
        };

        tracing::info!(
            from = %window.from.to_rfc3339(),
            to = %window.to.to_rfc3339(),
            strategy = ?self.config.strategy,
            "Checking deadlines"
        );

        let docs = self.store.query_tasks(&query).await?;
        let fetched = docs.len();

        let eligible: Vec<Task> = docs
            .iter()
            .filter_map(|doc| match Task::from_document(doc) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!(todo_id = %doc.id, error = %e, "Skipping todo with unreadable fields");
                    None
                }
            })
            .filter(|task| Self::is_eligible(task, &window))
            .collect();

        tracing::debug!(fetched, eligible = eligible.len(), "Scan complete");
        Ok(eligible)
    }
}
