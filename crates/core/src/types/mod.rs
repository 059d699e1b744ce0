pub mod configuration;
pub mod identifiers;
pub mod metadata;
pub mod parameters;
pub mod result;

// Re-export commonly used types
pub use configuration::{ExecutorConfiguration, ExtendedContext, SupportedExtensionContexts};
pub use identifiers::{
    Context, IdentifierRegistry, NamedIdentifier, OutputFormat, result_format, run_context,
};
pub use metadata::{RunConfiguration, RunConfigurationMetadata};
pub use parameters::{
    DEFAULT_PARAMETERS_NAME, ExtendedRunParameters, LastUsed, ParameterKey, ParameterSet,
    WorkingDirOpts, WorkingDirPolicy,
};
pub use result::{PossibleRunResult, RunExecutionMetadata, RunResult, RunResultError};
