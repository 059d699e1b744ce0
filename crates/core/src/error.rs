use std::io;

/// Errors that can occur while registering, configuring or dispatching runs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Run configuration {0} is already registered")]
    DuplicateArtifact(String),

    #[error("Unknown run configuration: {0}")]
    UnknownArtifact(String),

    #[error("Executor {executor} cannot run extension '{extension}' with context '{context}'")]
    UnsupportedExecution {
        executor: String,
        extension: String,
        context: String,
    },

    #[error("Parameters {parameters} do not apply: {reason}")]
    ParameterMismatch { parameters: String, reason: String },

    #[error("Executor {executor} has no handler for extension '{extension}' with context '{context}'")]
    NoHandler {
        executor: String,
        extension: String,
        context: String,
    },

    #[error("Parameters {0} are still referenced as last used")]
    ParametersInUse(String),

    #[error("Default parameters {0} cannot be deleted")]
    DefaultParametersProtected(String),

    #[error("Unknown execution parameters: {0}")]
    UnknownParameters(String),

    #[error("A parameter set named '{name}' already exists for {scope}")]
    DuplicateParameterName { name: String, scope: String },

    #[error("Registry error: {0}")]
    RegistryError(String),

    #[error("No live provider owns run configuration {0}")]
    UnknownProvider(String),

    #[error("Provider discarded the run input for context '{0}'")]
    RunInputDiscarded(String),

    #[error("Executor {0} requires a working directory but none could be resolved")]
    MissingWorkingDirectory(String),

    #[error("Executor {executor} failed: {message}")]
    ExecutionFailed { executor: String, message: String },

    #[error("No run configuration is currently focused")]
    NoFocusedArtifact,

    #[error("Nothing has been executed yet")]
    NothingToReRun,

    #[error("Row {0} is out of range")]
    InvalidSelection(usize),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn unsupported(executor: &str, extension: &str, context: &str) -> Self {
        Error::UnsupportedExecution {
            executor: executor.to_string(),
            extension: extension.to_string(),
            context: context.to_string(),
        }
    }

    pub(crate) fn mismatch(parameters: &str, reason: impl Into<String>) -> Self {
        Error::ParameterMismatch {
            parameters: parameters.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for runbridge operations
pub type Result<T> = std::result::Result<T, Error>;
