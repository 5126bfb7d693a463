//! Entity transformer
//!
//! Normalizes heterogeneous backend payloads into the canonical models.
//! The backend has changed shape several times: lists arrive bare or wrapped
//! in `{ "data": [...] }`, ids arrive as numbers or strings, and the creation
//! timestamp has gone by five different keys. Everything here is tolerant:
//! anomalies are logged and degraded, never raised to the user.

mod entities;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};

/// Keys that have carried the creation timestamp, in lookup order
pub const CREATED_AT_KEYS: [&str; 5] = [
    "create_at",
    "createAt",
    "created_at",
    "createdAt",
    "date_creation",
];

/// Keys that have carried the last-modification timestamp
pub const UPDATED_AT_KEYS: [&str; 2] = ["updated_at", "updatedAt"];

/// Entities that can be built from a raw backend payload
pub trait FromPayload: Sized {
    /// Entity name used in logs
    const ENTITY: &'static str;

    /// Build the canonical entity from one JSON object
    fn from_payload(value: Value) -> Result<Self>;
}

// ============================================================================
// Envelopes
// ============================================================================

/// Extract the array of a list response.
///
/// Accepts a bare array or `{ "data": [...] }`. Anything else is logged
/// and yields an empty list.
pub fn unwrap_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            other => {
                log::warn!(
                    "[transform] Unexpected list envelope (data = {}), returning empty list",
                    describe(other.as_ref())
                );
                Vec::new()
            }
        },
        other => {
            log::warn!(
                "[transform] Expected a list, got {}, returning empty list",
                describe(Some(&other))
            );
            Vec::new()
        }
    }
}

/// Remove a `{ "data": {...} }` wrapper from a single-item response
pub fn unwrap_item(value: Value) -> Value {
    match value {
        Value::Object(mut obj) if !obj.contains_key("id") && obj.contains_key("data") => {
            match obj.remove("data") {
                Some(inner @ Value::Object(_)) => inner,
                Some(other) => {
                    obj.insert("data".to_string(), other);
                    Value::Object(obj)
                }
                None => Value::Object(obj),
            }
        }
        other => other,
    }
}

/// Decode a list response, skipping records that cannot be decoded
pub fn decode_list<T: FromPayload>(value: Value) -> Vec<T> {
    let items = unwrap_list(value);
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match T::from_payload(item) {
            Ok(entity) => Some(entity),
            Err(e) => {
                log::warn!(
                    "[transform] Skipping {} at index {}: {}",
                    T::ENTITY,
                    index,
                    e
                );
                None
            }
        })
        .collect();

    if decoded.len() < total {
        log::warn!(
            "[transform] Decoded {}/{} {} records",
            decoded.len(),
            total,
            T::ENTITY
        );
    }
    decoded
}

/// Decode a single-item response
pub fn decode_item<T: FromPayload>(value: Value) -> Result<T> {
    T::from_payload(unwrap_item(value))
}

fn describe(value: Option<&Value>) -> &'static str {
    match value {
        None | Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "a boolean",
        Some(Value::Number(_)) => "a number",
        Some(Value::String(_)) => "a string",
        Some(Value::Array(_)) => "an array",
        Some(Value::Object(_)) => "an object",
    }
}

pub(crate) fn expect_object<'a>(value: &'a Value, entity: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::internal(format!("{} payload is {}", entity, describe(Some(value)))))
}

// ============================================================================
// Ids
// ============================================================================

/// Compare two ids that may have arrived as numbers or strings.
///
/// Both sides are coerced to integers when possible; otherwise the trimmed
/// strings are compared.
pub fn ids_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}

/// Integer id accepting a JSON number or a numeric string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexId(pub i64);

impl<'de> Deserialize<'de> for FlexId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FlexIdVisitor;

        impl Visitor<'_> for FlexIdVisitor {
            type Value = FlexId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer id or a numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<FlexId, E> {
                Ok(FlexId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<FlexId, E> {
                i64::try_from(v)
                    .map(FlexId)
                    .map_err(|_| E::custom(format!("id {} out of range", v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<FlexId, E> {
                if v.fract() == 0.0 && v.abs() < 9.0e15 {
                    Ok(FlexId(v as i64))
                } else {
                    Err(E::custom(format!("id {} is not an integer", v)))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<FlexId, E> {
                v.trim()
                    .parse::<i64>()
                    .map(FlexId)
                    .map_err(|_| E::custom(format!("id {:?} is not numeric", v)))
            }
        }

        deserializer.deserialize_any(FlexIdVisitor)
    }
}

/// Text field that some endpoints send as a number (phones, string ids)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexString(pub String);

impl<'de> Deserialize<'de> for FlexString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(FlexString(s)),
            Value::Number(n) => Ok(FlexString(n.to_string())),
            Value::Bool(b) => Ok(FlexString(b.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a string or a number, got {}",
                describe(Some(&other))
            ))),
        }
    }
}

/// Boolean accepting `true`, `1`, `"1"`, `"true"` or `"active"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexBool(pub bool);

impl<'de> Deserialize<'de> for FlexBool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let flag = match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => matches!(
                s.trim().to_lowercase().as_str(),
                "1" | "true" | "active" | "actif" | "yes" | "oui"
            ),
            _ => false,
        };
        Ok(FlexBool(flag))
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Outcome of looking up a timestamp among candidate keys
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampLookup {
    Parsed(DateTime<Utc>),
    /// The first present key held a value that could not be parsed
    Unparsable(&'static str),
    Missing,
}

/// Find the first present (non-null) key among `keys` and parse its value.
///
/// Later keys are not consulted once a present key is found, even if it
/// fails to parse.
pub fn lookup_timestamp(obj: &Map<String, Value>, keys: &[&'static str]) -> TimestampLookup {
    let Some((key, value)) = keys
        .iter()
        .find_map(|k| obj.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))
    else {
        return TimestampLookup::Missing;
    };

    match parse_timestamp_value(value) {
        Some(ts) => TimestampLookup::Parsed(ts),
        None => TimestampLookup::Unparsable(key),
    }
}

/// Creation timestamp, falling back to now when missing or unparsable
pub fn created_at_or_now(obj: &Map<String, Value>, entity: &str) -> DateTime<Utc> {
    match lookup_timestamp(obj, &CREATED_AT_KEYS) {
        TimestampLookup::Parsed(ts) => ts,
        TimestampLookup::Unparsable(key) => {
            log::warn!(
                "[transform] {} {}: unparsable '{}', using current time (timestamp unreliable)",
                entity,
                record_label(obj),
                key
            );
            Utc::now()
        }
        TimestampLookup::Missing => {
            log::warn!(
                "[transform] {} {}: no creation date, using current time (timestamp unreliable)",
                entity,
                record_label(obj)
            );
            Utc::now()
        }
    }
}

/// Optional timestamp; unparsable values are logged and dropped
pub fn optional_timestamp(
    obj: &Map<String, Value>,
    keys: &[&'static str],
    entity: &str,
) -> Option<DateTime<Utc>> {
    match lookup_timestamp(obj, keys) {
        TimestampLookup::Parsed(ts) => Some(ts),
        TimestampLookup::Unparsable(key) => {
            log::warn!(
                "[transform] {} {}: ignoring unparsable '{}'",
                entity,
                record_label(obj),
                key
            );
            None
        }
        TimestampLookup::Missing => None,
    }
}

fn record_label(obj: &Map<String, Value>) -> String {
    match obj.get("id") {
        Some(Value::Number(n)) => format!("#{}", n),
        Some(Value::String(s)) => format!("#{}", s),
        _ => "(no id)".to_string(),
    }
}

/// Parse a JSON timestamp: a date string or epoch seconds/milliseconds
pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            let raw = n.as_i64()?;
            // Anything past year 5138 in seconds is really milliseconds
            if raw.abs() >= 100_000_000_000 {
                DateTime::from_timestamp_millis(raw)
            } else {
                DateTime::from_timestamp(raw, 0)
            }
        }
        _ => None,
    }
}

/// Parse the textual timestamp encodings seen across the backend's history
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a calendar date, ignoring any time-of-day suffix
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_unwrap_list_bare_and_enveloped() {
        let bare = unwrap_list(json!([{ "id": 1 }]));
        let wrapped = unwrap_list(json!({ "data": [{ "id": 1 }] }));
        assert_eq!(bare, wrapped);
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn test_unwrap_list_unexpected_shapes_are_empty() {
        assert!(unwrap_list(json!({ "data": { "id": 1 } })).is_empty());
        assert!(unwrap_list(json!({ "items": [] })).is_empty());
        assert!(unwrap_list(json!("oops")).is_empty());
        assert!(unwrap_list(Value::Null).is_empty());
    }

    #[test]
    fn test_unwrap_item() {
        assert_eq!(unwrap_item(json!({ "data": { "id": 4 } })), json!({ "id": 4 }));
        // A record that merely has a `data` field is left alone
        let record = json!({ "id": 4, "data": { "x": 1 } });
        assert_eq!(unwrap_item(record.clone()), record);
    }

    #[test]
    fn test_ids_match_numeric_coercion() {
        assert!(ids_match("5", "5"));
        assert!(ids_match(" 05", "5"));
        assert!(!ids_match("5", "6"));
        assert!(ids_match("abc-1", "abc-1"));
        assert!(!ids_match("abc-1", "1"));
    }

    #[test]
    fn test_flex_id() {
        let id: FlexId = serde_json::from_value(json!(12)).unwrap();
        assert_eq!(id, FlexId(12));
        let id: FlexId = serde_json::from_value(json!("12")).unwrap();
        assert_eq!(id, FlexId(12));
        let id: FlexId = serde_json::from_value(json!(12.0)).unwrap();
        assert_eq!(id, FlexId(12));
        assert!(serde_json::from_value::<FlexId>(json!("Site A")).is_err());
        assert!(serde_json::from_value::<FlexId>(json!(1.5)).is_err());
    }

    #[test]
    fn test_flex_bool() {
        for truthy in [json!(true), json!(1), json!("active"), json!("1")] {
            assert!(serde_json::from_value::<FlexBool>(truthy).unwrap().0);
        }
        for falsy in [json!(false), json!(0), json!("inactive"), Value::Null] {
            assert!(!serde_json::from_value::<FlexBool>(falsy).unwrap().0);
        }
    }

    #[test]
    fn test_lookup_uses_first_present_key() {
        let o = obj(json!({
            "createAt": "2024-03-01T10:00:00Z",
            "created_at": "2020-01-01T00:00:00Z"
        }));
        match lookup_timestamp(&o, &CREATED_AT_KEYS) {
            TimestampLookup::Parsed(ts) => assert_eq!(ts.year(), 2024),
            other => panic!("unexpected lookup result: {:?}", other),
        }
    }

    #[test]
    fn test_lookup_does_not_fall_through_on_parse_failure() {
        let o = obj(json!({ "create_at": "not a date", "created_at": "2020-01-01" }));
        assert_eq!(
            lookup_timestamp(&o, &CREATED_AT_KEYS),
            TimestampLookup::Unparsable("create_at")
        );
    }

    #[test]
    fn test_lookup_skips_null_keys() {
        let o = obj(json!({ "create_at": null, "date_creation": "2023-05-06" }));
        match lookup_timestamp(&o, &CREATED_AT_KEYS) {
            TimestampLookup::Parsed(ts) => assert_eq!((ts.month(), ts.day()), (5, 6)),
            other => panic!("unexpected lookup result: {:?}", other),
        }
    }

    #[test]
    fn test_created_at_falls_back_to_now() {
        let before = Utc::now();
        let ts = created_at_or_now(&obj(json!({ "id": 1 })), "agent");
        assert!(ts >= before);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-01T10:15:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        let laravel = parse_timestamp("2024-03-01 10:15:00").unwrap();
        assert_eq!((laravel.hour(), laravel.minute()), (10, 15));

        let micro = parse_timestamp("2024-03-01T10:15:00.123456").unwrap();
        assert_eq!(micro.minute(), 15);

        let date_only = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date_only.hour(), 0);

        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_parse_epoch_values() {
        let secs = parse_timestamp_value(&json!(1_700_000_000)).unwrap();
        let millis = parse_timestamp_value(&json!(1_700_000_000_000_i64)).unwrap();
        assert_eq!(secs, millis);
    }

    #[test]
    fn test_parse_calendar_date() {
        let d = parse_calendar_date("2026-10-18T00:00:00.000000Z").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert!(parse_calendar_date("18/10/2026").is_none());
    }
}
