// src/engine/sourcemap.rs

//! Source map v3 as written next to each output file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::paths::relative_path;

fn default_version() -> u32 {
    3
}

/// `null` reads as the field's default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn nullable_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Option::<u32>::deserialize(deserializer).map(|v| v.unwrap_or_else(default_version))
}

/// A source map document.
///
/// Unknown fields (`x_google_ignoreList`, `sections`, ...) are kept and
/// written back unchanged. Any field may be `null`, and so may individual
/// `sources`, `sourcesContent` and `names` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    #[serde(default = "default_version", deserialize_with = "nullable_version")]
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub sources: Vec<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub sources_content: Vec<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub names: Vec<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub mappings: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SourceMap {
    fn default() -> Self {
        Self {
            version: default_version(),
            file: None,
            source_root: None,
            sources: Vec::new(),
            sources_content: Vec::new(),
            names: Vec::new(),
            mappings: String::new(),
            extra: Map::new(),
        }
    }
}

impl SourceMap {
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Point the map at its final location: `file` becomes the destination's
    /// base name and `sources` the single source path relative to the
    /// destination's directory.
    pub fn relocate(&mut self, filename: &Path, destname: &Path) {
        self.file = Some(base_name(destname));
        let dest_dir = destname.parent().unwrap_or_else(|| Path::new("."));
        self.sources = vec![Some(relative_path(dest_dir, filename))];
    }

    /// A map pairing every generated line with the same line of `filename`.
    pub fn identity(code: &str, filename: &Path) -> Self {
        let lines = code.lines().count().max(1);
        let mut mappings = String::from("AAAA");
        for _ in 1..lines {
            // Column 0 of the next source line.
            mappings.push_str(";AACA");
        }

        Self {
            file: Some(base_name(filename)),
            sources: vec![Some(base_name(filename))],
            sources_content: vec![Some(code.to_string())],
            mappings,
            ..Self::default()
        }
    }
}

/// Trailer appended to written code.
pub fn source_mapping_url_comment(destname: &Path) -> String {
    format!("\n//# sourceMappingURL={}.map", base_name(destname))
}

/// `<destname>.map`.
pub fn map_path_for(destname: &Path) -> PathBuf {
    let mut path = destname.as_os_str().to_owned();
    path.push(".map");
    PathBuf::from(path)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
