//! Scan cycle orchestration.
//!
//! One cycle scans for eligible tasks, then dispatches them one at a time.
//! Only a failed scan fails the cycle; per-task problems end up in the
//! task's outcome or in the logs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use taskping_common::error::AppError;
use taskping_common::types::NotificationOutcome;

use crate::dispatcher::NotificationDispatcher;
use crate::scanner::DeadlineScanner;

pub const NO_DEADLINES_MESSAGE: &str = "No upcoming deadlines found.";

/// Response payload of one scan cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub success: bool,
    pub processed: usize,
    pub results: Vec<NotificationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct DeadlineProcessor {
    scanner: DeadlineScanner,
    dispatcher: NotificationDispatcher,
}

impl DeadlineProcessor {
    pub fn new(scanner: DeadlineScanner, dispatcher: NotificationDispatcher) -> Self {
        Self {
            scanner,
            dispatcher,
        }
    }

    /// Run one scan-and-notify cycle at `now`.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, AppError> {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("scan_cycle", %cycle_id);

        self.cycle(now).instrument(span).await
    }

    async fn cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, AppError> {
        let tasks = self.scanner.scan(now).await?;

        if tasks.is_empty() {
            tracing::info!("No upcoming deadlines");
            return Ok(CycleReport {
                success: true,
                processed: 0,
                results: Vec::new(),
                message: Some(NO_DEADLINES_MESSAGE.to_string()),
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        for task in &tasks {
            if let Some(outcome) = self.dispatcher.dispatch(task, now).await {
                results.push(outcome);
            }
        }

        tracing::info!(
            candidates = tasks.len(),
            processed = results.len(),
            "Scan cycle finished"
        );

        Ok(CycleReport {
            success: true,
            processed: results.len(),
            results,
            message: None,
        })
    }
}
