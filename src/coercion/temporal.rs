use chrono::{DateTime, Utc};

use crate::error::{EvalError, Result};
use crate::value::Value;

/// Normalize any temporal source to an instant.
///
/// Accepts instants, dates, offset date-times, clocks (read once) and
/// ISO-8601 / RFC 3339 text carrying an offset.
pub(crate) fn instant_of(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::Instant(t) | Value::Date(t) => Ok(*t),
        Value::Temporal(t) => Ok(t.with_timezone(&Utc)),
        Value::Clock(clock) => Ok(clock.now()),
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| EvalError::conversion(s, "String", "Instant")),
        other => Err(EvalError::conversion(other, other.kind_name(), "Instant")),
    }
}

/// Like [`instant_of`], truncated to whole milliseconds
pub(crate) fn date_of(value: &Value) -> Result<DateTime<Utc>> {
    let instant = instant_of(value)?;
    DateTime::from_timestamp_millis(instant.timestamp_millis())
        .ok_or_else(|| EvalError::conversion(value, value.kind_name(), "Date"))
}

#[test]
fn test_offsets_normalize() {
    let a = instant_of(&Value::from("2024-03-01T12:00:00+02:00")).unwrap();
    let b = instant_of(&Value::from("2024-03-01T10:00:00Z")).unwrap();
    assert_eq!(a, b);
    assert!(instant_of(&Value::from("yesterday")).is_err());
}
