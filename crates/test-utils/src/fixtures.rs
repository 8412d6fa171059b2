//! Document builders for tests.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use taskping_common::types::{FieldValue, StoredDocument};

/// Fixed "now" used across tests: 2026-10-19T08:00:00Z.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
}

/// Native store timestamp.
pub fn native(at: DateTime<Utc>) -> FieldValue {
    FieldValue::Timestamp(at)
}

/// ISO-8601 string, as written by clients that serialize dates themselves.
pub fn iso(at: DateTime<Utc>) -> FieldValue {
    FieldValue::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// A `todo`-status task without a `notificationSent` field.
pub fn todo_doc(id: &str, title: &str, due: FieldValue, owner: &str) -> StoredDocument {
    StoredDocument::new(id)
        .with("title", FieldValue::String(title.to_string()))
        .with("status", FieldValue::String("todo".to_string()))
        .with("dueDate", due)
        .with("userId", FieldValue::String(owner.to_string()))
}

pub fn user_doc(id: &str, fcm_token: Option<&str>, email: Option<&str>) -> StoredDocument {
    let mut doc = StoredDocument::new(id);
    if let Some(token) = fcm_token {
        doc = doc.with("fcmToken", FieldValue::String(token.to_string()));
    }
    if let Some(email) = email {
        doc = doc.with("email", FieldValue::String(email.to_string()));
    }
    doc
}
