//! Execution parameter records
//!
//! A parameter set is scoped to a triple `(executor, extension, context)`.
//! Three flavours exist: the synthesized Default set, global presets shared
//! by every artifact of the triple, and custom presets bound to one artifact.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

use crate::impl_case_insensitive_deserialize;

/// Display name of the synthesized default parameter set
pub const DEFAULT_PARAMETERS_NAME: &str = "Default";

/// Where the working directory of an execution comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkingDirPolicy {
    /// Directory containing the artifact
    #[default]
    FileDir,
    /// The host's current working directory
    Cwd,
    /// The path stored alongside the policy
    Fixed,
}

impl_case_insensitive_deserialize!(
    WorkingDirPolicy,
    FileDir => "file-dir",
    FileDir => "file_dir",
    FileDir => "filedir",
    Cwd => "cwd",
    Fixed => "fixed"
);

impl fmt::Display for WorkingDirPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkingDirPolicy::FileDir => write!(f, "file-dir"),
            WorkingDirPolicy::Cwd => write!(f, "cwd"),
            WorkingDirPolicy::Fixed => write!(f, "fixed"),
        }
    }
}

/// Working directory options of a parameter set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkingDirOpts {
    pub policy: WorkingDirPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl WorkingDirOpts {
    pub fn file_dir() -> Self {
        Self::default()
    }

    pub fn cwd() -> Self {
        Self {
            policy: WorkingDirPolicy::Cwd,
            path: None,
        }
    }

    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        Self {
            policy: WorkingDirPolicy::Fixed,
            path: Some(path.into()),
        }
    }
}

/// The natural key for parameter scoping: `(executor, extension, context)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterKey {
    pub executor_id: String,
    pub extension: String,
    pub context: String,
}

impl ParameterKey {
    pub fn new(
        executor_id: impl Into<String>,
        extension: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            executor_id: executor_id.into(),
            extension: extension.into(),
            context: context.into(),
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.executor_id, self.extension, self.context)
    }
}

/// A named, persisted bundle of executor settings plus cwd policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub uuid: String,
    pub name: String,
    pub executor_id: String,
    pub extension: String,
    pub context: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_global: bool,
    /// Owning artifact for custom presets, `None` for global ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_uuid: Option<String>,
    /// Global preset this custom preset was copied from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<String>,
    #[serde(default)]
    pub working_dir: WorkingDirOpts,
    #[serde(default)]
    pub executor_params: Map<String, Value>,
}

impl ParameterSet {
    fn build(key: &ParameterKey, name: String, executor_params: Map<String, Value>) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            name,
            executor_id: key.executor_id.clone(),
            extension: key.extension.clone(),
            context: key.context.clone(),
            is_default: false,
            is_global: true,
            artifact_uuid: None,
            derived_from: None,
            working_dir: WorkingDirOpts::default(),
            executor_params,
        }
    }

    /// The synthesized "Default" set of a triple
    pub fn default_for(key: &ParameterKey, executor_params: Map<String, Value>) -> Self {
        let mut params = Self::build(key, DEFAULT_PARAMETERS_NAME.to_string(), executor_params);
        params.is_default = true;
        params
    }

    /// A named preset shown for every artifact of the triple
    pub fn global(
        key: &ParameterKey,
        name: impl Into<String>,
        executor_params: Map<String, Value>,
    ) -> Self {
        Self::build(key, name.into(), executor_params)
    }

    /// A named preset bound to a single artifact
    pub fn custom(
        key: &ParameterKey,
        name: impl Into<String>,
        artifact_uuid: impl Into<String>,
        executor_params: Map<String, Value>,
    ) -> Self {
        let mut params = Self::build(key, name.into(), executor_params);
        params.is_global = false;
        params.artifact_uuid = Some(artifact_uuid.into());
        params
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    pub fn with_working_dir(mut self, working_dir: WorkingDirOpts) -> Self {
        self.working_dir = working_dir;
        self
    }

    pub fn key(&self) -> ParameterKey {
        ParameterKey::new(&self.executor_id, &self.extension, &self.context)
    }

    pub fn is_custom(&self) -> bool {
        !self.is_global && !self.is_default
    }

    /// Whether this set can be used to run `artifact` through the triple
    pub fn applies_to(&self, key: &ParameterKey, artifact_uuid: &str) -> bool {
        self.key() == *key
            && (self.is_default
                || self.is_global
                || self.artifact_uuid.as_deref() == Some(artifact_uuid))
    }

    /// Whether this set is listed when browsing `artifact`'s parameters
    pub fn visible_for(&self, artifact_uuid: Option<&str>) -> bool {
        if self.is_default || self.is_global {
            return true;
        }
        artifact_uuid.is_some() && self.artifact_uuid.as_deref() == artifact_uuid
    }
}

/// The executor and parameter set last dispatched for an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastUsed {
    pub executor_id: String,
    pub parameter_uuid: String,
}

impl LastUsed {
    pub fn new(executor_id: impl Into<String>, parameter_uuid: impl Into<String>) -> Self {
        Self {
            executor_id: executor_id.into(),
            parameter_uuid: parameter_uuid.into(),
        }
    }
}

/// Parameters handed to an executor handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedRunParameters {
    /// The parameter record the run was dispatched with
    pub params: ParameterSet,
    /// Working directory resolved from the record's policy
    pub working_dir: Option<PathBuf>,
    /// Copy of `params.executor_params`
    pub executor_params: Map<String, Value>,
}
