//! Message payloads and the reminder templates.

use chrono::{DateTime, FixedOffset, Offset, Utc};

pub const DEADLINE_PUSH_TITLE: &str = "⏰ Deadline approaching!";
pub const DEFAULT_PUSH_TITLE: &str = "New Notification";

/// A push notification addressed to one device token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
}

impl PushMessage {
    /// Fixed reminder template for a task nearing its deadline.
    pub fn deadline(token: impl Into<String>, task_title: &str) -> Self {
        Self {
            token: token.into(),
            title: DEADLINE_PUSH_TITLE.to_string(),
            body: format!("Task \"{}\" is due soon.", task_title),
        }
    }
}

/// Template parameters of a reminder email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to_email: String,
    pub user_name: String,
    pub task_title: String,
    pub due_time: String,
    pub minutes_left: Option<String>,
    pub subject: String,
    pub language: String,
}

impl EmailMessage {
    pub fn reminder(
        to_email: impl Into<String>,
        user_name: impl Into<String>,
        task_title: &str,
        due_time: impl Into<String>,
        minutes_left: Option<String>,
        language: &str,
    ) -> Self {
        Self {
            to_email: to_email.into(),
            user_name: user_name.into(),
            task_title: task_title.to_string(),
            due_time: due_time.into(),
            minutes_left,
            subject: reminder_subject(language, task_title),
            language: language.to_string(),
        }
    }

    /// Plain-text rendering used when mailing through a relay directly.
    pub fn plain_text(&self) -> String {
        let vietnamese = self.language == "vi";
        let mut text = if vietnamese {
            format!(
                "Xin chào {},\n\nCông việc \"{}\" sắp đến hạn",
                self.user_name, self.task_title
            )
        } else {
            format!(
                "Hi {},\n\nYour task \"{}\" is due soon",
                self.user_name, self.task_title
            )
        };

        if !self.due_time.is_empty() {
            text.push_str(if vietnamese { " lúc " } else { " at " });
            text.push_str(&self.due_time);
        }
        text.push('.');

        if let Some(minutes) = self.minutes_left.as_deref().filter(|m| !m.is_empty()) {
            text.push_str(&if vietnamese {
                format!(" Còn {} phút.", minutes)
            } else {
                format!(" {} minutes left.", minutes)
            });
        }
        text.push('\n');
        text
    }
}

/// Localized reminder subject; Vietnamese for `vi`, English otherwise.
pub fn reminder_subject(language: &str, task_title: &str) -> String {
    if language == "vi" {
        format!("⏰ Nhắc nhở Deadline - {}", task_title)
    } else {
        format!("⏰ Task Deadline Reminder - {}", task_title)
    }
}

/// Render a due instant as `HH:MM` at the given UTC offset.
pub fn format_due_time(due: DateTime<Utc>, utc_offset_minutes: i32) -> String {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    due.with_timezone(&offset).format("%H:%M").to_string()
}

/// Whole minutes until `due`, rounded up and never negative.
pub fn minutes_left(now: DateTime<Utc>, due: DateTime<Utc>) -> i64 {
    let seconds = (due - now).num_seconds().max(0);
    (seconds + 59) / 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deadline_push_template() {
        let msg = PushMessage::deadline("tok1", "Write report");
        assert_eq!(msg.title, "⏰ Deadline approaching!");
        assert_eq!(msg.body, "Task \"Write report\" is due soon.");
        assert_eq!(msg.token, "tok1");
    }

    #[test]
    fn test_subject_localization() {
        assert_eq!(
            reminder_subject("vi", "Report"),
            "⏰ Nhắc nhở Deadline - Report"
        );
        assert_eq!(
            reminder_subject("en", "Report"),
            "⏰ Task Deadline Reminder - Report"
        );
    }

    #[test]
    fn test_format_due_time_applies_offset() {
        let due = Utc.with_ymd_and_hms(2026, 10, 19, 8, 5, 0).unwrap();
        assert_eq!(format_due_time(due, 420), "15:05");
        assert_eq!(format_due_time(due, 0), "08:05");
        assert_eq!(format_due_time(due, -90), "06:35");
    }

    #[test]
    fn test_format_due_time_out_of_range_offset_is_utc() {
        let due = Utc.with_ymd_and_hms(2026, 10, 19, 8, 5, 0).unwrap();
        assert_eq!(format_due_time(due, 1440), "08:05");
        assert_eq!(format_due_time(due, i32::MAX), "08:05");
    }

    #[test]
    fn test_minutes_left_rounds_up() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        assert_eq!(minutes_left(now, now), 0);
        assert_eq!(minutes_left(now, now + chrono::Duration::seconds(61)), 2);
        assert_eq!(minutes_left(now, now + chrono::Duration::minutes(10)), 10);
        assert_eq!(minutes_left(now, now - chrono::Duration::minutes(3)), 0);
    }

    #[test]
    fn test_plain_text_rendering() {
        let msg = EmailMessage::reminder(
            "a@b.com",
            "An",
            "Report",
            "15:05",
            Some("5".into()),
            "en",
        );
        assert_eq!(
            msg.plain_text(),
            "Hi An,\n\nYour task \"Report\" is due soon at 15:05. 5 minutes left.\n"
        );

        let vi = EmailMessage::reminder("a@b.com", "An", "Report", "", None, "vi");
        assert_eq!(vi.plain_text(), "Xin chào An,\n\nCông việc \"Report\" sắp đến hạn.\n");
    }
}
