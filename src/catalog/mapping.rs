use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::models::{EntityKind, FieldInput, Record};
use crate::store::{value_to_plain, Row};

pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const LAST_DOWNLOADED_COLUMN: &str = "last_downloaded";
const CAPTION_FIELD: &str = "caption";

/// Shapes a store row into a record; missing or null columns become defaults.
pub fn record_from_row(kind: EntityKind, row: &Row) -> Record {
    let mut record = Record::new(kind);
    record.id = row_id(row);
    record.last_downloaded = row
        .get(LAST_DOWNLOADED_COLUMN)
        .and_then(Value::as_str)
        .and_then(parse_datetime);

    for spec in kind.fields() {
        let Some(value) = row.get(spec.column).filter(|v| !v.is_null()) else {
            continue;
        };
        record.set(spec.name, column_text(spec.input, value));
    }

    record
}

/// Every editable column, keyed by store column name. Never includes the id
/// or `last_downloaded`.
pub fn write_payload(record: &Record) -> Row {
    record
        .kind
        .fields()
        .iter()
        .map(|spec| {
            let value = match spec.input {
                FieldInput::Number => number_value(record.number(spec.name)),
                _ => json!(record.get(spec.name)),
            };
            (spec.column.to_string(), value)
        })
        .collect()
}

/// Merges the row echoed back by a write into the record that was saved.
///
/// The id, image, caption and numeric fields come from the store when it
/// returned them; everything else keeps the submitted value.
pub fn merge_saved(mut record: Record, row: &Row) -> Record {
    if let Some(id) = row_id(row) {
        record.id = Some(id);
    }

    let kind = record.kind;
    for spec in kind.fields() {
        let echoed = spec.name == kind.image_field()
            || spec.name == CAPTION_FIELD
            || spec.input == FieldInput::Number;
        if !echoed {
            continue;
        }
        match row.get(spec.column) {
            Some(Value::Null) if spec.name == CAPTION_FIELD => {
                record.set(spec.name, "");
            }
            Some(value) if !value.is_null() => {
                let text = column_text(spec.input, value);
                // An empty echo never clobbers a resolved image URL.
                if spec.name == kind.image_field() && text.is_empty() {
                    continue;
                }
                record.set(spec.name, text);
            }
            _ => {}
        }
    }

    record
}

pub fn row_id(row: &Row) -> Option<String> {
    row.get(ID_COLUMN)
        .map(value_to_plain)
        .filter(|id| !id.is_empty())
}

fn column_text(input: FieldInput, value: &Value) -> String {
    let text = value_to_plain(value);
    match input {
        FieldInput::Number => text.trim().parse::<f64>().unwrap_or(0.0).to_string(),
        _ => text,
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres timestamp without time zone (e.g., "2026-01-11T12:34:56.789")
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    None
}
