//! Due-date normalization.
//!
//! Task documents carry `dueDate` either as a native store timestamp or as an
//! ISO-8601 string, depending on which client wrote them. Everything is turned
//! into a `DateTime<Utc>` here before any comparison happens.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::AppError;
use crate::types::FieldValue;

/// Offset-less formats accepted for string due dates, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Normalize a stored date value into an instant.
///
/// Accepts native timestamps, RFC 3339 strings, offset-less ISO strings and
/// integer epoch milliseconds. Any other shape is a `Parse` error.
pub fn to_instant(value: &FieldValue) -> Result<DateTime<Utc>, AppError> {
    match value {
        FieldValue::Timestamp(ts) => Ok(*ts),
        FieldValue::String(s) => parse_iso(s),
        FieldValue::Integer(millis) => Utc
            .timestamp_millis_opt(*millis)
            .single()
            .ok_or_else(|| AppError::Parse(format!("epoch millis out of range: {}", millis))),
        other => Err(AppError::Parse(format!(
            "unsupported date shape: {:?}",
            other
        ))),
    }
}

fn parse_iso(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::Parse(format!("unrecognized date string: {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_native_timestamp_passes_through() {
        assert_eq!(to_instant(&FieldValue::Timestamp(instant())).unwrap(), instant());
    }

    #[test]
    fn test_rfc3339_with_z_and_offset() {
        let z = FieldValue::String("2026-10-19T08:30:00.000Z".into());
        let offset = FieldValue::String("2026-10-19T15:30:00+07:00".into());
        assert_eq!(to_instant(&z).unwrap(), instant());
        assert_eq!(to_instant(&offset).unwrap(), instant());
    }

    #[test]
    fn test_naive_string_is_utc() {
        let naive = FieldValue::String("2026-10-19T08:30".into());
        assert_eq!(to_instant(&naive).unwrap(), instant());
    }

    #[test]
    fn test_epoch_millis() {
        let millis = FieldValue::Integer(instant().timestamp_millis());
        assert_eq!(to_instant(&millis).unwrap(), instant());
    }

    #[test]
    fn test_unrecognized_shapes_fail() {
        assert!(matches!(
            to_instant(&FieldValue::String("tomorrow-ish".into())),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(
            to_instant(&FieldValue::Bool(true)),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(to_instant(&FieldValue::Null), Err(AppError::Parse(_))));
    }
}
