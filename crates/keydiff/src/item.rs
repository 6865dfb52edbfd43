use serde_json::{Map, Value};

/// Record adapter: how the differ reads a key, converts a record into a
/// field map, and short-circuits identity comparisons.
///
/// The runner is generic over this trait, so any record representation works
/// as long as it can answer these four questions.
pub trait Item<T> {
    /// True when a key field is configured. Without one the runner degrades
    /// to the positional compare.
    fn has_key(&self) -> bool;

    /// Key of a record, unique within each list. A record that cannot
    /// produce a key yields the empty string, which the runner treats like a
    /// duplicate.
    fn key(&self, record: &T) -> String;

    /// Cheap identity check. `true` means the records are structurally equal
    /// and no update needs to be emitted for the pair.
    fn is_shared(&self, a: &T, b: &T) -> bool;

    /// Field map of a record, used for insert payloads and update diffs.
    fn to_map(&self, record: &T) -> Map<String, Value>;
}

/// Adapter for `serde_json::Value` records keyed by a named field.
#[derive(Debug, Clone, Default)]
pub struct VariantItem {
    key_field: Option<String>,
}

impl VariantItem {
    /// Adapter with no key field; the runner will compare positionally.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_field(name: impl Into<String>) -> Self {
        Self {
            key_field: Some(name.into()),
        }
    }

    pub fn set_key_field(&mut self, name: impl Into<String>) {
        self.key_field = Some(name.into());
    }
}

impl Item<Value> for VariantItem {
    fn has_key(&self) -> bool {
        self.key_field
            .as_deref()
            .map(|name| !name.is_empty())
            .unwrap_or(false)
    }

    fn key(&self, record: &Value) -> String {
        let Some(field) = self.key_field.as_deref() else {
            return String::new();
        };
        match record.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    // JSON values carry no instance identity; equality is the closest
    // sharing check.
    fn is_shared(&self, a: &Value, b: &Value) -> bool {
        a == b
    }

    fn to_map(&self, record: &Value) -> Map<String, Value> {
        match record {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }
}
