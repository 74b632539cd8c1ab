use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use super::kind::{EntityKind, FieldInput};

/// Pixel offset applied to a quote's author image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImageOffset {
    pub x: f64,
    pub y: f64,
}

/// One editable catalog row, keyed by logical field name.
///
/// Every field in `kind.fields()` always has a value: text fields default to
/// the empty string and numeric fields to `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: EntityKind,
    pub id: Option<String>,
    pub last_downloaded: Option<DateTime<Utc>>,
    values: BTreeMap<&'static str, String>,
}

impl Record {
    pub fn new(kind: EntityKind) -> Self {
        let values = kind
            .fields()
            .iter()
            .map(|spec| {
                let default = match spec.input {
                    FieldInput::Number => "0",
                    _ => "",
                };
                (spec.name, default.to_string())
            })
            .collect();

        Self {
            kind,
            id: None,
            last_downloaded: None,
            values,
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// Sets a field by logical name. Returns `false` for names the kind
    /// does not define.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.kind.field(name) {
            Some(spec) => {
                self.values.insert(spec.name, value.into());
                true
            }
            None => {
                tracing::warn!("{} has no field named {}", self.kind.singular(), name);
                false
            }
        }
    }

    /// Numeric value of a field; unparsable or empty text reads as zero.
    pub fn number(&self, name: &str) -> f64 {
        self.get(name).trim().parse().unwrap_or(0.0)
    }

    pub fn image(&self) -> &str {
        self.get(self.kind.image_field())
    }

    pub fn set_image(&mut self, url: impl Into<String>) {
        self.set(self.kind.image_field(), url);
    }

    pub fn category(&self) -> &str {
        self.get(self.kind.category_field())
    }

    pub fn title(&self) -> &str {
        self.get(self.kind.title_field())
    }

    pub fn detail(&self) -> &str {
        self.get(self.kind.detail_field())
    }

    pub fn offset(&self) -> ImageOffset {
        match self.kind {
            EntityKind::Quote => ImageOffset {
                x: self.number("authorImageOffsetX"),
                y: self.number("authorImageOffsetY"),
            },
            _ => ImageOffset::default(),
        }
    }

    /// Case-insensitive substring match over the kind's search fields.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.kind
            .search_fields()
            .iter()
            .any(|name| self.get(name).to_lowercase().contains(&needle))
    }

    /// Logical-name JSON view, as printed by the command line.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("kind".to_string(), json!(self.kind));
        map.insert("id".to_string(), json!(self.id));
        for spec in self.kind.fields() {
            let value = match spec.input {
                FieldInput::Number => json!(self.number(spec.name)),
                _ => json!(self.get(spec.name)),
            };
            map.insert(spec.name.to_string(), value);
        }
        map.insert(
            "lastDownloaded".to_string(),
            json!(self.last_downloaded.map(|dt| dt.to_rfc3339())),
        );
        Value::Object(map)
    }
}
