//! Attribute records: the typed field/value bags exchanged with adapters and
//! the configuration front-end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value.
///
/// Records in this domain are flat: there are no nested records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Set of strings, stored in the order it was authored or reported
    Set(Vec<String>),
    /// Plain string scalar
    String(String),
    /// Any other value the core passes through without interpreting it
    Opaque(serde_json::Value),
}

impl Value {
    /// Build a set value from anything iterable over strings.
    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// The string payload, if this is a scalar string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The set payload, if this is a set.
    pub fn as_set(&self) -> Option<&[String]> {
        match self {
            Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the value carries no information (empty string or empty set).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(s) => s.is_empty(),
            Self::Set(items) => items.is_empty(),
            Self::Opaque(v) => v.is_null(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::Set(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Set(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                write!(f, "]")
            }
            Self::Opaque(v) => write!(f, "{v}"),
        }
    }
}

/// Desired or observed state of one resource instance.
///
/// Fields are kept ordered by name so that serialized state is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeRecord {
    fields: BTreeMap<String, Value>,
}

impl AttributeRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String value of a field, if present and scalar
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Set value of a field, if present and set-typed
    pub fn get_set(&self, field: &str) -> Option<&[String]> {
        self.get(field).and_then(Value::as_set)
    }

    /// Whether the field is present and non-empty
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.is_empty())
    }

    /// The populated identifier, if the record carries one in `field`.
    ///
    /// An empty string counts as absent.
    pub fn identifier(&self, field: &str) -> Option<&str> {
        self.get_str(field).filter(|id| !id.is_empty())
    }

    /// Overlay every field of `other` onto this record.
    pub fn merge(&mut self, other: AttributeRecord) {
        self.fields.extend(other.fields);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for AttributeRecord {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
