//! Scalar coercion.
//!
//! Inputs usually arrive as strings (from the command line) or as loosely
//! typed JSON. Each scalar is coerced to its declared type before it is
//! placed in the request.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};

use crate::error::{OperationError, OperationResult};
use crate::model::{ScalarType, TimestampFormat};

/// Coerce `value` to `ty`, rendering timestamps in `format`.
pub fn coerce_scalar(
    ty: ScalarType,
    value: Value,
    path: &str,
    format: TimestampFormat,
) -> OperationResult<Value> {
    match ty {
        ScalarType::String => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(type_error(path, "string", &other)),
        },
        ScalarType::Integer => {
            let n = to_i64(&value).ok_or_else(|| type_error(path, "integer", &value))?;
            i32::try_from(n)
                .map(|n| Value::Number(n.into()))
                .map_err(|_| OperationError::invalid_parameter(path, format!("{} is out of range for an integer", n)))
        }
        ScalarType::Long => to_i64(&value)
            .map(|n| Value::Number(n.into()))
            .ok_or_else(|| type_error(path, "long", &value)),
        ScalarType::Double => to_f64(&value)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| type_error(path, "double", &value)),
        ScalarType::Boolean => match &value {
            Value::Bool(_) => Ok(value),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            other => Err(type_error(path, "boolean", other)),
        },
        ScalarType::Timestamp => {
            let ts = parse_timestamp(&value).ok_or_else(|| type_error(path, "timestamp", &value))?;
            Ok(render_timestamp(ts, format))
        }
    }
}

/// Parse RFC 3339, a bare date, or epoch seconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
            }
            s.parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        }
        _ => None,
    }
}

fn render_timestamp(ts: DateTime<Utc>, format: TimestampFormat) -> Value {
    match format {
        TimestampFormat::EpochSeconds => Value::Number(ts.timestamp().into()),
        TimestampFormat::Iso8601 => Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_error(path: &str, expected: &str, value: &Value) -> OperationError {
    OperationError::invalid_parameter(path, format!("expected {}, got {}", expected, value))
}
