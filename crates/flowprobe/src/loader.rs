//! YAML document loading.
//!
//! Components that follow file references (the referential composer) read
//! documents through [`DocumentLoader`] instead of touching the filesystem
//! directly. A missing or malformed document loads as an empty mapping.

use serde::{Deserialize, Deserializer};
use serde_yaml_ng::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of YAML documents.
pub trait DocumentLoader {
    /// Load the document at `path`, or an empty mapping if it cannot be read.
    fn load(&self, path: &Path) -> Value;
}

/// Loads documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl DocumentLoader for FsLoader {
    fn load(&self, path: &Path) -> Value {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unable to read YAML file");
                return empty_document();
            }
        };
        parse_document(path, &text)
    }
}

/// In-memory documents keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document.
    #[must_use]
    pub fn with_document(mut self, path: impl Into<PathBuf>, yaml: impl Into<String>) -> Self {
        self.documents.insert(path.into(), yaml.into());
        self
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Value {
        match self.documents.get(path) {
            Some(text) => parse_document(path, text),
            None => {
                tracing::warn!(path = %path.display(), "Document not found");
                empty_document()
            }
        }
    }
}

/// The value returned for unreadable documents.
pub fn empty_document() -> Value {
    Value::Mapping(Mapping::new())
}

/// Whether a loaded document carries no content.
pub fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(map) => map.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        _ => false,
    }
}

fn parse_document(path: &Path, text: &str) -> Value {
    match serde_yaml_ng::from_str::<Value>(text) {
        Ok(Value::Null) => empty_document(),
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed YAML file");
            empty_document()
        }
    }
}

/// Deserialize a field where YAML `null` means "use the default".
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a list where the list itself or any entry may be `null`.
pub(crate) fn nullable_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let entries = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(entries.into_iter().flatten().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fs_loader_reads_yaml() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "key: value").expect("write");
        let value = FsLoader.load(file.path());
        assert_eq!(value["key"], Value::String("value".into()));
    }

    #[test]
    fn test_fs_loader_missing_file_is_empty() {
        let value = FsLoader.load(Path::new("/definitely/not/here.yaml"));
        assert!(is_empty_document(&value));
    }

    #[test]
    fn test_fs_loader_malformed_file_is_empty() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "key: [unclosed").expect("write");
        assert!(is_empty_document(&FsLoader.load(file.path())));
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_document("a.yaml", "- suite: {}\n");
        assert!(!is_empty_document(&loader.load(Path::new("a.yaml"))));
        assert!(is_empty_document(&loader.load(Path::new("b.yaml"))));
    }

    #[test]
    fn test_blank_document_is_empty() {
        let loader = MemoryLoader::new().with_document("blank.yaml", "");
        assert!(is_empty_document(&loader.load(Path::new("blank.yaml"))));
    }
}
