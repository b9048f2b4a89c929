// src/config/options.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Engine options passed through the pipeline untouched by the core.
///
/// This is an arbitrary JSON object; only the transform engine interprets
/// it. Plugins negotiate changes during `config_resolved` by returning a new
/// value rather than mutating a shared one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformOptions(Map<String, Value>);

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, replacing any existing value for `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Follow a dotted path through nested objects.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |value, key| value.get(*key))
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Fill top-level keys missing from `self` with values from `defaults`.
    /// Keys the caller set always win.
    pub fn merge_defaults(mut self, defaults: &TransformOptions) -> Self {
        for (key, value) in defaults.0.iter() {
            self.0.entry(key.clone()).or_insert_with(|| value.clone());
        }
        self
    }

    /// Set `value` at a nested `path` unless something is already there.
    ///
    /// Intermediate objects are created as needed. A non-object value in the
    /// way is left alone and the default is not applied.
    pub fn set_default_at(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };

        let mut current = &mut self.0;
        for key in parents {
            let entry = current
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(map) => current = map,
                _ => return,
            }
        }

        current.entry((*last).to_string()).or_insert(value);
    }
}

impl From<Map<String, Value>> for TransformOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Defaults every build starts from: `target = "node14"`, `format = "cjs"`.
pub fn default_transform_options() -> TransformOptions {
    TransformOptions::new()
        .with("target", "node14")
        .with("format", "cjs")
}
