use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::AppError;
use crate::timestamp::to_instant;

/// Display name used when a user document carries none.
pub const DEFAULT_USER_NAME: &str = "User";

/// A single field of a store document, decoded from the store's typed wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Map(BTreeMap<String, FieldValue>),
    Array(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Raw document as returned by the store: an opaque id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: FieldValue) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Non-empty string field; empty strings count as absent.
    fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(FieldValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Task lifecycle status. Only `Todo` is eligible for deadline notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Todo,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Other(s) => s,
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(value: &str) -> Self {
        match value {
            "todo" => TaskStatus::Todo,
            other => TaskStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A to-do item with a normalized due date.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub owner_id: String,
    pub notification_sent: bool,
}

impl Task {
    /// Build a task from a raw document.
    ///
    /// The owner is read from `userId`, falling back to `ownerId`. A missing
    /// `notificationSent` flag counts as `false`.
    pub fn from_document(doc: &StoredDocument) -> Result<Self, AppError> {
        let due = doc
            .get("dueDate")
            .ok_or_else(|| AppError::Parse(format!("todo {} has no dueDate", doc.id)))?;
        let owner_id = doc
            .text("userId")
            .or_else(|| doc.text("ownerId"))
            .ok_or_else(|| AppError::Parse(format!("todo {} has no owner", doc.id)))?;

        Ok(Self {
            id: doc.id.clone(),
            title: doc.text("title").unwrap_or_default(),
            status: doc
                .get("status")
                .and_then(FieldValue::as_str)
                .map(TaskStatus::from)
                .unwrap_or_else(|| TaskStatus::Other(String::new())),
            due_date: to_instant(due)?,
            owner_id,
            notification_sent: doc
                .get("notificationSent")
                .and_then(FieldValue::as_bool)
                .unwrap_or(false),
        })
    }
}

/// Contact details of a task owner. Read-only to this system.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub id: String,
    pub fcm_token: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl User {
    pub fn from_document(doc: &StoredDocument) -> Self {
        Self {
            id: doc.id.clone(),
            fcm_token: doc.text("fcmToken"),
            email: doc.text("email"),
            display_name: doc.text("displayName"),
        }
    }

    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(DEFAULT_USER_NAME)
    }

    /// True when neither channel has a destination.
    pub fn is_unreachable(&self) -> bool {
        self.fcm_token.is_none() && self.email.is_none()
    }
}

/// How the deadline scanner asks the store for candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStrategy {
    /// Query on `status` only and evaluate the window and flag in-process.
    Narrow,
    /// Push the full predicate into the store query.
    Precise,
}

impl FromStr for ScanStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "narrow" => Ok(ScanStrategy::Narrow),
            "precise" => Ok(ScanStrategy::Precise),
            other => Err(AppError::Config(format!("unknown scan strategy {:?}", other))),
        }
    }
}

/// What happens to a task whose owner has neither a push token nor an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachablePolicy {
    /// Mark the task notified so it is never retried.
    MarkNotified,
    /// Leave the flag untouched; the task stays eligible while in the window.
    LeavePending,
}

impl FromStr for UnreachablePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mark" | "mark_notified" => Ok(UnreachablePolicy::MarkNotified),
            "leave" | "leave_pending" => Ok(UnreachablePolicy::LeavePending),
            other => Err(AppError::Config(format!(
                "unknown unreachable policy {:?}",
                other
            ))),
        }
    }
}

/// Result of one delivery channel, rendered as `skipped`, `success: …` or `failed: …`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    Skipped,
    Success(String),
    Failed(String),
}

impl ChannelStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ChannelStatus::Success(_))
    }
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelStatus::Skipped => write!(f, "skipped"),
            ChannelStatus::Success(detail) => write!(f, "success: {}", detail),
            ChannelStatus::Failed(error) => write!(f, "failed: {}", error),
        }
    }
}

impl Serialize for ChannelStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-channel delivery results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelResults {
    pub fcm: ChannelStatus,
    pub email: ChannelStatus,
}

impl ChannelResults {
    /// Error messages of the failed channels, prefixed with the channel name.
    pub fn errors(&self) -> Vec<String> {
        [("fcm", &self.fcm), ("email", &self.email)]
            .into_iter()
            .filter_map(|(channel, status)| match status {
                ChannelStatus::Failed(e) => Some(format!("{}: {}", channel, e)),
                _ => None,
            })
            .collect()
    }
}

/// Whether a task's owner could be addressed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Notified,
    Unreachable,
    /// Owner could not be looked up; nothing was sent or written
    Failed,
}

/// Destinations a task's notification was addressed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentTo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Per-task record of one scan cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub todo_id: String,
    pub title: String,
    pub status: OutcomeStatus,
    pub sent_to: SentTo,
    pub results: ChannelResults,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Whether the `notificationSent` write succeeded
    pub marked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn todo_doc() -> StoredDocument {
        StoredDocument::new("t1")
            .with("title", FieldValue::String("Write report".into()))
            .with("status", FieldValue::String("todo".into()))
            .with(
                "dueDate",
                FieldValue::Timestamp(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()),
            )
            .with("userId", FieldValue::String("u1".into()))
    }

    #[test]
    fn test_task_from_document_defaults_flag() {
        let task = Task::from_document(&todo_doc()).unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.owner_id, "u1");
        assert!(!task.notification_sent);
    }

    #[test]
    fn test_task_owner_falls_back_to_owner_id() {
        let mut doc = todo_doc();
        doc.fields.remove("userId");
        let doc = doc.with("ownerId", FieldValue::String("u9".into()));
        assert_eq!(Task::from_document(&doc).unwrap().owner_id, "u9");
    }

    #[test]
    fn test_task_without_due_date_is_parse_error() {
        let mut doc = todo_doc();
        doc.fields.remove("dueDate");
        assert!(matches!(Task::from_document(&doc), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_user_empty_strings_are_absent() {
        let doc = StoredDocument::new("u1")
            .with("fcmToken", FieldValue::String(String::new()))
            .with("email", FieldValue::String("a@b.com".into()));
        let user = User::from_document(&doc);
        assert_eq!(user.fcm_token, None);
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
        assert_eq!(user.name(), "User");
        assert!(!user.is_unreachable());
    }

    #[test]
    fn test_channel_status_serializes_as_string() {
        let results = ChannelResults {
            fcm: ChannelStatus::Success("projects/p/messages/1".into()),
            email: ChannelStatus::Failed("timeout".into()),
        };
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["fcm"], "success: projects/p/messages/1");
        assert_eq!(json["email"], "failed: timeout");
        assert_eq!(results.errors(), vec!["email: timeout".to_string()]);
        assert_eq!(ChannelStatus::Skipped.to_string(), "skipped");
    }

    #[test]
    fn test_strategy_and_policy_parse() {
        assert_eq!("precise".parse::<ScanStrategy>().unwrap(), ScanStrategy::Precise);
        assert!("fuzzy".parse::<ScanStrategy>().is_err());
        assert_eq!(
            "leave".parse::<UnreachablePolicy>().unwrap(),
            UnreachablePolicy::LeavePending
        );
    }

    #[test]
    fn test_outcome_serializes_todo_id() {
        let outcome = NotificationOutcome {
            todo_id: "t1".into(),
            title: "Write report".into(),
            status: OutcomeStatus::Notified,
            sent_to: SentTo {
                push_token: Some("tok1".into()),
                email: None,
            },
            results: ChannelResults::default(),
            errors: vec![],
            marked: true,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["todoId"], "t1");
        assert_eq!(json["sentTo"]["pushToken"], "tok1");
        assert!(json["sentTo"].get("email").is_none());
        assert!(json.get("errors").is_none());
    }
}
