use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::identifiers::Context;

/// Identity of a runnable artifact, owned by the provider that announced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfigurationMetadata {
    /// Unique identifier generated and managed by the provider
    pub uuid: String,
    /// Human-readable name for the artifact
    pub name: String,
    /// Identifier of the provider that produced the artifact
    pub source: String,
    /// Opaque path of the artifact; never interpreted by the registry
    pub path: PathBuf,
    pub input_extension: String,
    pub context: Context,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl RunConfigurationMetadata {
    pub fn new(
        uuid: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        path: impl Into<PathBuf>,
        input_extension: impl Into<String>,
        context: Context,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            source: source.into(),
            path: path.into(),
            input_extension: input_extension.into(),
            context,
            timestamp: Utc::now(),
            extra: Map::new(),
        }
    }

    /// Identifier of this artifact's context
    pub fn context_id(&self) -> String {
        self.context.id()
    }

    /// The `(extension, context)` pair used as a registry key
    pub fn input_key(&self) -> (String, String) {
        (self.input_extension.clone(), self.context_id())
    }
}

/// Everything an executor needs to run an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Input to process; its shape is agreed between provider and executor
    pub run_input: Value,
    pub metadata: RunConfigurationMetadata,
    /// Result formats requested from the executor, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_formats: Vec<String>,
}

impl RunConfiguration {
    pub fn new(run_input: Value, metadata: RunConfigurationMetadata) -> Self {
        Self {
            run_input,
            metadata,
            output_formats: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::identifiers::run_context;

    #[test]
    fn test_metadata_keys() {
        let metadata = RunConfigurationMetadata::new(
            "A1",
            "script.py",
            "editor",
            "/work/script.py",
            "py",
            Context::new("File"),
        );
        assert_eq!(metadata.context_id(), run_context::FILE);
        assert_eq!(metadata.input_key(), ("py".to_string(), "file".to_string()));
    }

    #[test]
    fn test_metadata_serialization_skips_empty_extra() {
        let metadata = RunConfigurationMetadata::new(
            "A1",
            "script.py",
            "editor",
            "script.py",
            "py",
            Context::new("File"),
        );
        let json = serde_json::to_value(&metadata).unwrap();
        assert!(json.get("extra").is_none());
        let back: RunConfigurationMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, metadata);
    }
}
