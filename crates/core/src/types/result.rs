use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::identifiers::result_format;
use super::metadata::RunConfigurationMetadata;

/// Error record an executor may return in place of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResultError {
    pub code: i32,
    pub message: String,
}

/// Timing and provenance of an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunExecutionMetadata {
    pub executor: String,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl RunExecutionMetadata {
    pub fn started(executor: impl Into<String>) -> Self {
        Self {
            executor: executor.into(),
            start_timestamp: Utc::now(),
            end_timestamp: None,
            extra: Map::new(),
        }
    }

    pub fn finish(mut self) -> Self {
        self.end_timestamp = Some(Utc::now());
        self
    }
}

/// Output produced by an executor handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Identifier of the result format, used to pick viewers
    pub output_format: String,
    pub run_output: Value,
    pub input_extension: String,
    pub metadata: RunConfigurationMetadata,
    pub execution_metadata: RunExecutionMetadata,
    #[serde(default)]
    pub is_error: bool,
}

/// Either a result or an error record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PossibleRunResult {
    Result(Box<RunResult>),
    Error(RunResultError),
}

impl PossibleRunResult {
    /// Format identifier of the payload; error records have none
    pub fn output_format(&self) -> Option<&str> {
        match self {
            PossibleRunResult::Result(result) => Some(result.output_format.as_str()),
            PossibleRunResult::Error(_) => None,
        }
    }

    /// Whether viewers should be offered for this result
    pub fn is_displayable(&self) -> bool {
        self.output_format()
            .is_some_and(|format| format != result_format::NO_DISPLAY)
    }
}

impl From<RunResult> for PossibleRunResult {
    fn from(result: RunResult) -> Self {
        PossibleRunResult::Result(Box::new(result))
    }
}

impl From<RunResultError> for PossibleRunResult {
    fn from(error: RunResultError) -> Self {
        PossibleRunResult::Error(error)
    }
}
