//! Column coercion. The agent writes through a loosely typed layer, so numbers
//! can come back as text and JSON as plain strings; readers go through these
//! helpers instead of `row.get::<_, f64>`.

use rusqlite::types::Value as SqlValue;
use rusqlite::Row;
use serde_json::Value;

pub(crate) fn value(row: &Row<'_>, idx: usize) -> rusqlite::Result<SqlValue> {
    row.get::<_, SqlValue>(idx)
}

pub(crate) fn f64_of(v: &SqlValue) -> Option<f64> {
    match v {
        SqlValue::Integer(i) => Some(*i as f64),
        SqlValue::Real(f) => Some(*f),
        SqlValue::Text(s) => {
            let s = s.trim().trim_matches('"');
            s.parse::<f64>().ok()
        }
        SqlValue::Null | SqlValue::Blob(_) => None,
    }
    .filter(|f| f.is_finite())
}

pub(crate) fn i64_of(v: &SqlValue) -> Option<i64> {
    match v {
        SqlValue::Integer(i) => Some(*i),
        _ => f64_of(v).map(|f| f.round() as i64),
    }
}

pub(crate) fn bool_of(v: &SqlValue) -> Option<bool> {
    match v {
        SqlValue::Integer(i) => Some(*i != 0),
        SqlValue::Real(f) => Some(*f != 0.0),
        SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" | "yes" => Some(true),
            "0" | "f" | "false" | "no" => Some(false),
            _ => None,
        },
        SqlValue::Null | SqlValue::Blob(_) => None,
    }
}

pub(crate) fn text_of(v: &SqlValue) -> Option<String> {
    match v {
        SqlValue::Text(s) => Some(s.clone()),
        SqlValue::Integer(i) => Some(i.to_string()),
        SqlValue::Real(f) => Some(f.to_string()),
        SqlValue::Null | SqlValue::Blob(_) => None,
    }
}

/// JSON column: parsed when it holds JSON text, otherwise kept as a string.
pub(crate) fn json_of(v: &SqlValue) -> Option<Value> {
    match v {
        SqlValue::Text(s) => Some(serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone()))),
        SqlValue::Integer(i) => Some(Value::from(*i)),
        SqlValue::Real(f) => Some(Value::from(*f)),
        SqlValue::Null | SqlValue::Blob(_) => None,
    }
}

pub(crate) fn col_f64(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(f64_of(&value(row, idx)?))
}

pub(crate) fn col_i64(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    Ok(i64_of(&value(row, idx)?))
}

pub(crate) fn col_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(text_of(&value(row, idx)?))
}

pub(crate) fn col_json(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Value>> {
    Ok(json_of(&value(row, idx)?))
}

pub(crate) fn col_bool(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<bool>> {
    Ok(bool_of(&value(row, idx)?))
}

/// Timestamp format used for rows this service writes.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_numbers_coerce() {
        assert_eq!(f64_of(&SqlValue::Text("20".into())), Some(20.0));
        assert_eq!(f64_of(&SqlValue::Text("\"2.5\"".into())), Some(2.5));
        assert_eq!(i64_of(&SqlValue::Text("300".into())), Some(300));
        assert_eq!(f64_of(&SqlValue::Text("lots".into())), None);
        assert_eq!(f64_of(&SqlValue::Null), None);
    }

    #[test]
    fn bools_from_mixed_storage() {
        assert_eq!(bool_of(&SqlValue::Integer(1)), Some(true));
        assert_eq!(bool_of(&SqlValue::Text("false".into())), Some(false));
        assert_eq!(bool_of(&SqlValue::Null), None);
    }

    #[test]
    fn json_columns_fall_back_to_strings() {
        assert_eq!(
            json_of(&SqlValue::Text("{\"model\":\"m\"}".into())),
            Some(serde_json::json!({"model": "m"}))
        );
        assert_eq!(
            json_of(&SqlValue::Text("gpt-x".into())),
            Some(Value::String("gpt-x".into()))
        );
    }
}
