//! Dynamic values flowing through template contexts.
//!
//! Plain data converts from anything `serde::Serialize`. Two variants are
//! specific to rendering: [`Value::Safe`] is markup that must not be escaped
//! again (component output, slot output), and [`Value::Component`] is a live
//! component instance whose attributes and slot fields are looked up on demand.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::component::ComponentHandle;

/// Ordered string-keyed map of values.
pub type Map = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Markup that is emitted verbatim even when autoescaping is on.
    Safe(String),
    List(Vec<Value>),
    Map(Map),
    Component(ComponentHandle),
}

impl Value {
    /// Wrap already-rendered markup.
    #[must_use]
    pub fn safe(markup: impl Into<String>) -> Self {
        Self::Safe(markup.into())
    }

    /// Convert any serializable record into a value tree.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when `value` cannot be represented as JSON.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Self::from)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Template truthiness: empty strings, empty collections, zero and null are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) | Self::Safe(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            Self::Component(_) => true,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Safe(s) => Some(s),
            _ => None,
        }
    }

    /// Look up one segment of a dotted path.
    ///
    /// Maps are keyed by name, lists by decimal index, and components
    /// resolve `content`, slot fields and serialized attributes.
    #[must_use]
    pub fn get_attr(&self, key: &str) -> Option<Value> {
        match self {
            Self::Map(map) => map.get(key).cloned(),
            Self::List(items) => key.parse::<usize>().map_or(None, |idx| items.get(idx).cloned()),
            Self::Component(handle) => handle.attribute(key),
            _ => None,
        }
    }

    /// Items visited by a `for` loop. Maps iterate their keys; scalars yield nothing.
    #[must_use]
    pub fn iter_items(&self) -> Vec<Value> {
        match self {
            Self::List(items) => items.clone(),
            Self::Map(map) => map.keys().map(|k| Self::Str(k.clone())).collect(),
            _ => Vec::new(),
        }
    }

    /// Length for the `length` filter.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Str(s) | Self::Safe(s) => s.chars().count(),
            Self::List(items) => items.len(),
            Self::Map(map) => map.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text emitted for `{{ value }}`.
    #[must_use]
    pub fn render(&self, autoescape: bool) -> String {
        let text = match self {
            Self::Null => return String::new(),
            Self::Safe(s) => return s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
            Self::List(_) | Self::Map(_) => self.to_json().to_string(),
            Self::Component(handle) => handle.type_name().to_owned(),
        };
        if autoescape { escape_html(&text) } else { text }
    }

    /// Plain JSON view. Safe markup becomes a string, components become null.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null | Self::Component(_) => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Str(s) | Self::Safe(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => {
                serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }

    /// False when [`Value::to_json`] would lose something a template can see:
    /// safe markup turns into plain text and components turn into null.
    #[must_use]
    pub fn survives_json(&self) -> bool {
        match self {
            Self::Safe(_) | Self::Component(_) => false,
            Self::List(items) => items.iter().all(Self::survives_json),
            Self::Map(map) => map.values().all(Self::survives_json),
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_) => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a) | Self::Safe(a), Self::Str(b) | Self::Safe(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Component(a), Self::Component(b)) => a.same_instance(b),
            _ => false,
        }
    }
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Null, Self::Int)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Map(value)
    }
}

impl From<ComponentHandle> for Value {
    fn from(value: ComponentHandle) -> Self {
        Self::Component(value)
    }
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
