//! Keyed configuration store backing the parameter store
//!
//! Values live in named sections under `/`-separated keys. The Run core
//! only uses the `run` section.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Section holding every persisted Run value
pub const RUN_SECTION: &str = "run";

pub trait ConfigStore {
    fn get(&self, section: &str, key: &str) -> Option<Value>;

    fn set(&mut self, section: &str, key: &str, value: Value);

    fn remove(&mut self, section: &str, key: &str) -> Option<Value>;

    /// Keys of a section starting with `prefix`, in insertion order
    fn keys_with_prefix(&self, section: &str, prefix: &str) -> Vec<String>;

    /// Make pending changes durable
    fn flush(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
struct Sections {
    sections: IndexMap<String, Map<String, Value>>,
}

impl Sections {
    fn section(&self, section: &str) -> Option<&Map<String, Value>> {
        self.sections.get(section)
    }

    fn get(&self, section: &str, key: &str) -> Option<Value> {
        self.section(section).and_then(|s| s.get(key)).cloned()
    }

    fn set(&mut self, section: &str, key: &str, value: Value) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn remove(&mut self, section: &str, key: &str) -> Option<Value> {
        self.sections
            .get_mut(section)
            .and_then(|s| s.shift_remove(key))
    }

    fn keys_with_prefix(&self, section: &str, prefix: &str) -> Vec<String> {
        self.section(section)
            .map(|s| {
                s.keys()
                    .filter(|key| key.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Ephemeral store; `flush` is a no-op
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Sections,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, section: &str, key: &str) -> Option<Value> {
        self.data.get(section, key)
    }

    fn set(&mut self, section: &str, key: &str, value: Value) {
        self.data.set(section, key, value);
    }

    fn remove(&mut self, section: &str, key: &str) -> Option<Value> {
        self.data.remove(section, key)
    }

    fn keys_with_prefix(&self, section: &str, prefix: &str) -> Vec<String> {
        self.data.keys_with_prefix(section, prefix)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Store persisted as one pretty-printed JSON document
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: Sections,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file yields an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            tracing::debug!("Loading run store from {:?}", path);
            let contents = fs::read_to_string(&path)?;
            let sections = serde_json::from_str(&contents).map_err(|e| {
                Error::Persistence(format!("Failed to parse {}: {e}", path.display()))
            })?;
            Sections { sections }
        } else {
            tracing::debug!("No run store at {:?}, starting empty", path);
            Sections::default()
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let contents = serde_json::to_string_pretty(&self.data.sections)?;
        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| {
            Error::Persistence(format!("Failed to replace {}: {}", self.path.display(), e.error))
        })?;
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, section: &str, key: &str) -> Option<Value> {
        self.data.get(section, key)
    }

    fn set(&mut self, section: &str, key: &str, value: Value) {
        self.data.set(section, key, value);
    }

    fn remove(&mut self, section: &str, key: &str) -> Option<Value> {
        self.data.remove(section, key)
    }

    fn keys_with_prefix(&self, section: &str, prefix: &str) -> Vec<String> {
        self.data.keys_with_prefix(section, prefix)
    }

    fn flush(&mut self) -> Result<()> {
        tracing::debug!("Flushing run store to {:?}", self.path);
        self.write_atomically().map_err(|e| match e {
            Error::Persistence(_) => e,
            other => Error::Persistence(format!("Failed to write {}: {other}", self.path.display())),
        })
    }
}
