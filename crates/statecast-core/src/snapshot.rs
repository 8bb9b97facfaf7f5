//! Snapshots: projected partial views of replica state.
//!
//! A snapshot is always a JSON object. Comparison is deep structural
//! equality; merging is shallow, one top-level key at a time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A partial view of a replica's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an existing JSON object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Convert a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Get a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Shallow merge: every top-level key of `patch` replaces the same key here.
    ///
    /// Nested objects are replaced wholesale, not merged recursively.
    pub fn merge(&mut self, patch: &Snapshot) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Project onto a subset of top-level keys. Missing keys are omitted.
    pub fn pick<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Snapshot {
        let mut out = Map::new();
        for key in keys {
            if let Some(value) = self.0.get(key) {
                out.insert(key.to_string(), value.clone());
            }
        }
        Snapshot(out)
    }

    /// Iterate over top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Snapshot> for Value {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.into_value()
    }
}
