//! On-demand notifier — one push and/or one email for an explicit target.
//!
//! Stateless: no store reads, no completion mark.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use taskping_common::types::{ChannelResults, DEFAULT_USER_NAME};
use taskping_notifier::Channels;
use taskping_notifier::message::{DEFAULT_PUSH_TITLE, EmailMessage, PushMessage};

/// Payload of a single ad-hoc notification.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    /// FCM device token
    pub token: Option<String>,
    /// Recipient email address
    pub email: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub user_name: Option<String>,
    pub task_title: Option<String>,
    pub due_time: Option<String>,
    /// Number or string; rendered as text
    pub minutes_left: Option<Value>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    pub results: ChannelResults,
}

pub struct OnDemandNotifier {
    channels: Channels,
}

impl OnDemandNotifier {
    pub fn new(channels: Channels) -> Self {
        Self { channels }
    }

    pub fn push_message(request: &SendNotificationRequest) -> Option<PushMessage> {
        let token = present(&request.token)?;
        Some(PushMessage {
            token: token.to_string(),
            title: present(&request.title)
                .unwrap_or(DEFAULT_PUSH_TITLE)
                .to_string(),
            body: request.body.clone().unwrap_or_default(),
        })
    }

    pub fn email_message(request: &SendNotificationRequest) -> Option<EmailMessage> {
        let email = present(&request.email)?;
        let task_title = present(&request.task_title)
            .or_else(|| present(&request.title))
            .unwrap_or_default();
        let minutes_left = request.minutes_left.as_ref().and_then(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });

        Some(EmailMessage::reminder(
            email,
            present(&request.user_name).unwrap_or(DEFAULT_USER_NAME),
            task_title,
            request.due_time.clone().unwrap_or_default(),
            minutes_left,
            present(&request.language_code).unwrap_or("vi"),
        ))
    }

    /// Attempt both channels for the request's targets.
    pub async fn send(&self, request: &SendNotificationRequest) -> SendNotificationResponse {
        let push = Self::push_message(request);
        let email = Self::email_message(request);

        let results = self.channels.deliver(push.as_ref(), email.as_ref()).await;
        tracing::info!(
            fcm = %results.fcm,
            email = %results.email,
            "On-demand notification handled"
        );

        SendNotificationResponse {
            success: true,
            results,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_defaults() {
        let request = SendNotificationRequest {
            token: Some("tok1".into()),
            ..Default::default()
        };
        let push = OnDemandNotifier::push_message(&request).unwrap();
        assert_eq!(push.title, "New Notification");
        assert_eq!(push.body, "");
        assert!(OnDemandNotifier::email_message(&request).is_none());
    }

    #[test]
    fn test_email_defaults_and_language() {
        let request: SendNotificationRequest = serde_json::from_value(serde_json::json!({
            "email": "a@b.com",
            "title": "Standup",
            "minutesLeft": 5,
            "languageCode": "en"
        }))
        .unwrap();

        let email = OnDemandNotifier::email_message(&request).unwrap();
        assert_eq!(email.user_name, "User");
        assert_eq!(email.task_title, "Standup");
        assert_eq!(email.minutes_left.as_deref(), Some("5"));
        assert_eq!(email.subject, "⏰ Task Deadline Reminder - Standup");
        assert!(OnDemandNotifier::push_message(&request).is_none());
    }

    #[test]
    fn test_task_title_wins_and_vi_is_default() {
        let request = SendNotificationRequest {
            email: Some("a@b.com".into()),
            title: Some("Generic".into()),
            task_title: Some("Specific".into()),
            minutes_left: Some(Value::String("3".into())),
            ..Default::default()
        };
        let email = OnDemandNotifier::email_message(&request).unwrap();
        assert_eq!(email.subject, "⏰ Nhắc nhở Deadline - Specific");
        assert_eq!(email.minutes_left.as_deref(), Some("3"));
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let request = SendNotificationRequest {
            token: Some(String::new()),
            email: Some(String::new()),
            ..Default::default()
        };
        assert!(OnDemandNotifier::push_message(&request).is_none());
        assert!(OnDemandNotifier::email_message(&request).is_none());
    }
}
