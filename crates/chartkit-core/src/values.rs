//! Override values with dotted-key expansion

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::io::Write;
use tempfile::NamedTempFile;

use crate::error::{CoreError, Result};

/// Ordered overrides, later entries win
pub type Overrides = IndexMap<String, JsonValue>;

/// Values document layered onto a chart as an extra `--values` file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Build values from ordered overrides, expanding dotted keys
    ///
    /// `image.tag: v2` becomes `image: {tag: v2}`. When a mapping lands on a
    /// key that already holds a mapping, the two are merged key by key
    /// (one level deep); anything else replaces what was there.
    pub fn from_overrides<'a, I>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a JsonValue)>,
    {
        let mut root = serde_json::Map::new();

        for (key, value) in overrides {
            if key.is_empty() || key.split('.').any(str::is_empty) {
                return Err(CoreError::InvalidOverride {
                    key: key.clone(),
                    message: "empty path segment".to_string(),
                });
            }

            let parts: Vec<&str> = key.split('.').collect();
            let (last, parents) = parts
                .split_last()
                .ok_or_else(|| CoreError::InvalidOverride {
                    key: key.clone(),
                    message: "empty key".to_string(),
                })?;

            let mut current = &mut root;
            for segment in parents {
                current = object_at(current, segment, key)?;
            }

            insert_shallow(current, last, value);
        }

        Ok(Self(JsonValue::Object(root)))
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Write the values to a temporary `.yaml` file
    ///
    /// The file is removed when the returned handle is dropped.
    pub fn write_temp(&self) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("chartkit-values-")
            .suffix(".yaml")
            .tempfile()?;
        file.write_all(self.to_yaml()?.as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

/// Mapping stored at `segment`, replacing any non-mapping value found there
fn object_at<'m>(
    map: &'m mut serde_json::Map<String, JsonValue>,
    segment: &str,
    key: &str,
) -> Result<&'m mut serde_json::Map<String, JsonValue>> {
    let slot = map
        .entry(segment.to_string())
        .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
    if !slot.is_object() {
        *slot = JsonValue::Object(serde_json::Map::new());
    }
    slot.as_object_mut().ok_or_else(|| CoreError::InvalidOverride {
        key: key.to_string(),
        message: format!("'{segment}' is not a mapping"),
    })
}

/// Insert `value` at `key`, merging one level deep when both sides are maps
fn insert_shallow(map: &mut serde_json::Map<String, JsonValue>, key: &str, value: &JsonValue) {
    match (map.get_mut(key), value) {
        (Some(JsonValue::Object(existing)), JsonValue::Object(incoming)) => {
            for (k, v) in incoming {
                existing.insert(k.clone(), v.clone());
            }
        }
        _ => {
            map.insert(key.to_string(), value.clone());
        }
    }
}
