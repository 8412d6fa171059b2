//! Notification dispatcher — delivers one eligible task to its owner.
//!
//! For each task:
//! 1. Resolve the owner; a missing user skips the task without any write
//! 2. Take the optional claim so overlapping cycles do not both deliver
//! 3. Attempt push and email independently
//! 4. Mark the task notified, whatever the delivery results were
//! 5. Return the outcome record for the cycle report

use std::sync::Arc;

use chrono::{DateTime, Utc};

use taskping_common::store::TaskStore;
use taskping_common::types::{
    ChannelResults, NotificationOutcome, OutcomeStatus, SentTo, Task, UnreachablePolicy,
};
use taskping_notifier::Channels;
use taskping_notifier::message::{EmailMessage, PushMessage, format_due_time, minutes_left};

use crate::claim::ClaimGuard;
use crate::marker::CompletionMarker;

/// Rendering and policy knobs of the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub language: String,
    pub utc_offset_minutes: i32,
    pub unreachable_policy: UnreachablePolicy,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            language: "vi".to_string(),
            utc_offset_minutes: 420,
            unreachable_policy: UnreachablePolicy::MarkNotified,
        }
    }
}

pub struct NotificationDispatcher {
    store: Arc<dyn TaskStore>,
    channels: Channels,
    marker: CompletionMarker,
    claims: Option<Arc<dyn ClaimGuard>>,
    settings: DispatchSettings,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn TaskStore>, channels: Channels, settings: DispatchSettings) -> Self {
        Self {
            marker: CompletionMarker::new(store.clone()),
            store,
            channels,
            claims: None,
            settings,
        }
    }

    /// Require a won claim before delivering each task.
    pub fn with_claims(mut self, claims: Arc<dyn ClaimGuard>) -> Self {
        self.claims = Some(claims);
        self
    }

    /// Dispatch one task. `None` means the task was skipped without delivery
    /// or write: owner missing or claim not won. A failed owner lookup is
    /// reported as a `Failed` outcome and the task stays eligible.
    pub async fn dispatch(&self, task: &Task, now: DateTime<Utc>) -> Option<NotificationOutcome> {
        let user = match self.store.get_user(&task.owner_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(
                    todo_id = %task.id,
                    user_id = %task.owner_id,
                    "Owner not found, skipping orphaned todo"
                );
                return None;
            }
            Err(e) => {
                tracing::error!(
                    todo_id = %task.id,
                    user_id = %task.owner_id,
                    error = %e,
                    "Owner lookup failed, leaving todo pending"
                );
                return Some(NotificationOutcome {
                    todo_id: task.id.clone(),
                    title: task.title.clone(),
                    status: OutcomeStatus::Failed,
                    sent_to: SentTo::default(),
                    results: ChannelResults::default(),
                    errors: vec![format!("owner lookup: {}", e)],
                    marked: false,
                });
            }
        };

        let mut outcome = NotificationOutcome {
            todo_id: task.id.clone(),
            title: task.title.clone(),
            status: OutcomeStatus::Notified,
            sent_to: SentTo {
                push_token: user.fcm_token.clone(),
                email: user.email.clone(),
            },
            results: ChannelResults::default(),
            errors: Vec::new(),
            marked: false,
        };

        if user.is_unreachable() {
            outcome.status = OutcomeStatus::Unreachable;
            tracing::warn!(
                todo_id = %task.id,
                user_id = %user.id,
                policy = ?self.settings.unreachable_policy,
                "Owner has neither push token nor email"
            );
            if self.settings.unreachable_policy == UnreachablePolicy::LeavePending {
                return Some(outcome);
            }
        } else {
            if let Some(claims) = &self.claims {
                match claims.try_claim(&task.id).await {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(e) => {
                        tracing::error!(todo_id = %task.id, error = %e, "Claim failed, skipping todo");
                        return None;
                    }
                }
            }

            let push = user
                .fcm_token
                .as_ref()
                .map(|token| PushMessage::deadline(token.as_str(), &task.title));
            let email = user.email.as_ref().map(|address| {
                EmailMessage::reminder(
                    address.as_str(),
                    user.name(),
                    &task.title,
                    format_due_time(task.due_date, self.settings.utc_offset_minutes),
                    Some(minutes_left(now, task.due_date).to_string()),
                    &self.settings.language,
                )
            });

            outcome.results = self.channels.deliver(push.as_ref(), email.as_ref()).await;
            outcome.errors = outcome.results.errors();
        }

        match self.marker.mark(&task.id).await {
            Ok(()) => outcome.marked = true,
            Err(e) => outcome.errors.push(format!("mark: {}", e)),
        }

        tracing::info!(
            todo_id = %task.id,
            user_id = %user.id,
            fcm = %outcome.results.fcm,
            email = %outcome.results.email,
            marked = outcome.marked,
            "Todo dispatched"
        );

        Some(outcome)
    }
}
