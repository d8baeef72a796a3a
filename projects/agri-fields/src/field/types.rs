// Field record definitions
//
// This module contains the struct definitions for field records that are
// persisted as one JSON file per field, plus the request shape the API
// accepts before validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Field identifier as supplied by the client: either a JSON number or a string.
///
/// The string form is the lookup key and is embedded in the storage filename.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldId {
    Number(Number),
    Text(String),
}

impl FieldId {
    /// True when the string form is non-empty and only uses `[A-Za-z0-9_-]`,
    /// i.e. it is safe to embed in a filename.
    pub fn is_filename_safe(&self) -> bool {
        let key = self.to_string();
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::Number(n) => write!(f, "{}", n),
            FieldId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for FieldId {
    fn from(value: u64) -> Self {
        FieldId::Number(value.into())
    }
}

impl From<&str> for FieldId {
    fn from(value: &str) -> Self {
        FieldId::Text(value.to_string())
    }
}

/// A polygon vertex in degrees
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// A stored field as written to `<slug>_<id>.json`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub id: FieldId,
    pub name: String,
    pub location: String,
    pub crop: String,
    pub coordinates: Vec<Coordinate>,
    /// Any other members the client sent along; kept verbatim on disk.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Create request body. Every member is optional here so that missing
/// values surface as validation errors instead of deserialization failures.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct NewField {
    #[serde(default)]
    pub id: Option<FieldId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Vec<Coordinate>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lower-cases `name` and replaces every run of characters outside
/// `[a-zA-Z0-9_-]` with a single `_`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c.to_ascii_lowercase());
            in_run = false;
        } else if !in_run {
            slug.push('_');
            in_run = true;
        }
    }
    slug
}

/// Storage filename for a field
pub fn field_filename(name: &str, id: &FieldId) -> String {
    format!("{}_{}.json", slugify(name), id)
}
