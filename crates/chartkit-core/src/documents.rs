//! Helpers for inspecting a rendered manifest stream

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};

/// Split a multi-document YAML stream into JSON values
///
/// Empty and null documents (e.g. a lone `---`) are dropped.
pub fn load_documents(rendered: &str) -> Result<Vec<JsonValue>> {
    let mut docs = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(rendered) {
        let value = JsonValue::deserialize(doc)?;
        let empty = match &value {
            JsonValue::Null => true,
            JsonValue::Object(map) => map.is_empty(),
            _ => false,
        };
        if !empty {
            docs.push(value);
        }
    }
    Ok(docs)
}

/// First document with the given `kind`
pub fn find_kind<'a>(docs: &'a [JsonValue], kind: &str) -> Result<&'a JsonValue> {
    docs.iter()
        .find(|doc| doc.get("kind").and_then(JsonValue::as_str) == Some(kind))
        .ok_or_else(|| CoreError::KindNotFound {
            kind: kind.to_string(),
        })
}

/// All documents with the given `kind`, in stream order
pub fn all_of_kind<'a>(docs: &'a [JsonValue], kind: &'a str) -> impl Iterator<Item = &'a JsonValue> {
    docs.iter()
        .filter(move |doc| doc.get("kind").and_then(JsonValue::as_str) == Some(kind))
}

/// First container spec of the first Deployment
pub fn primary_container(docs: &[JsonValue]) -> Result<&JsonValue> {
    let deployment = find_kind(docs, "Deployment")?;
    deployment
        .pointer("/spec/template/spec/containers/0")
        .ok_or_else(|| CoreError::KindNotFound {
            kind: "Deployment container".to_string(),
        })
}
