//! Document decoding from YAML and JSON.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::models::Document;

/// Top-level keys accepted by the JSON decoder.
const KNOWN_ROOT_FIELDS: &[&str] = &["ci"];

/// Encoding of a document on the wire or on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Yaml,
    Json,
}

impl InputFormat {
    /// Pick a format from a file extension. Anything but `.json` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Reader for configuration-item documents.
pub struct DocumentReader;

impl DocumentReader {
    /// Decode a YAML document. Empty input yields an empty document.
    pub fn from_yaml_str(content: &str) -> ModelResult<Document> {
        if content.trim().is_empty() {
            return Ok(Document::empty());
        }
        let document: Document = serde_yaml::from_str(content)?;
        Ok(document)
    }

    pub fn from_yaml_reader(mut reader: impl Read) -> ModelResult<Document> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_yaml_str(&content)
    }

    /// Decode a JSON document.
    ///
    /// JSON keys are camelCase (`authorCompany`, `disasterLvl`) and are mapped
    /// onto the same model as the kebab-case YAML keys. Unknown top-level
    /// fields are rejected.
    pub fn from_json_str(content: &str) -> ModelResult<Document> {
        let value: Value = serde_json::from_str(content)?;

        if let Value::Object(root) = &value {
            if let Some(unknown) = root
                .keys()
                .find(|key| !KNOWN_ROOT_FIELDS.contains(&key.as_str()))
            {
                return Err(ModelError::UnknownField(unknown.clone()));
            }
        }

        let document: Document = serde_json::from_value(kebab_keys(value))?;
        Ok(document)
    }

    pub fn from_json_reader(mut reader: impl Read) -> ModelResult<Document> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_json_str(&content)
    }

    /// Decode a document in the given format.
    pub fn decode(content: &str, format: InputFormat) -> ModelResult<Document> {
        match format {
            InputFormat::Yaml => Self::from_yaml_str(content),
            InputFormat::Json => Self::from_json_str(content),
        }
    }

    /// Read a document from disk, choosing the format by extension.
    pub fn read_file(path: impl AsRef<Path>) -> ModelResult<Document> {
        let path = path.as_ref();
        debug!("Reading document from {:?}", path);

        let content = fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&content, InputFormat::from_path(path))
    }
}

/// Recursively rewrite object keys from camelCase to kebab-case.
fn kebab_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (camel_to_kebab(&key), kebab_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(kebab_keys).collect()),
        other => other,
    }
}

fn camel_to_kebab(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
