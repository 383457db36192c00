//! The portable v3 source map interchange format.

use crate::vlq::DecodeError;
use crate::SourceMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// A serialized source map (revision 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapJson {
    /// Always 3.
    pub version: u8,
    /// The generated file this map describes.
    pub file: String,
    /// Prefix applied to every entry of `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    /// Original source files.
    pub sources: Vec<String>,
    /// Contents of the original sources, parallel to `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    /// Identifier names referenced by mappings.
    pub names: Vec<String>,
    /// The VLQ-encoded mappings.
    pub mappings: String,
}

/// An error reading a serialized source map.
#[derive(Debug, Error)]
pub enum SourceMapJsonError {
    /// The document is not valid JSON for a source map.
    #[error("invalid source map JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The version field is not 3.
    #[error("unsupported source map version {0}")]
    UnsupportedVersion(u8),
    /// The mappings string is malformed.
    #[error(transparent)]
    Mappings(#[from] DecodeError),
}

impl SourceMap {
    /// Serializes this map for the generated `file`, optionally embedding the
    /// original source text.
    pub fn to_json(&self, file: impl Into<String>, source_content: Option<&str>) -> SourceMapJson {
        SourceMapJson {
            version: 3,
            file: file.into(),
            source_root: None,
            sources: self.sources().to_vec(),
            sources_content: source_content.map(|content| vec![content.to_string()]),
            names: self.names().iter().map(|n| n.to_string()).collect(),
            mappings: self.encode(),
        }
    }

    /// Parses a serialized source map.
    pub fn from_json(json: &str) -> Result<Self, SourceMapJsonError> {
        let parsed: SourceMapJson = serde_json::from_str(json)?;
        if parsed.version != 3 {
            return Err(SourceMapJsonError::UnsupportedVersion(parsed.version));
        }
        let names = parsed.names.into_iter().map(SmolStr::from).collect();
        Ok(SourceMap::decode(&parsed.mappings, parsed.sources, names)?)
    }
}

impl SourceMapJson {
    /// Renders the map as a compact JSON string.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
