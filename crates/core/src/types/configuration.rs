//! Declarations exchanged at registration time
//!
//! Providers declare which `(extension, context)` pairs they can produce
//! input for; executors declare which pairs they can run, with a priority,
//! a configuration widget factory and cwd requirements.

use std::fmt;
use std::sync::Arc;

use super::identifiers::{Context, OutputFormat};
use crate::interfaces::ConfigurationWidgetFactory;

/// A context supported by a provider for one extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedContext {
    pub context: Context,
    /// Whether this context produces standalone artifacts (e.g. `File`)
    pub is_primary: bool,
    /// Whether the host shows a dedicated run action for this context
    pub is_shown: bool,
}

impl ExtendedContext {
    pub fn primary(context: Context) -> Self {
        Self {
            context,
            is_primary: true,
            is_shown: true,
        }
    }

    pub fn derived(context: Context) -> Self {
        Self {
            context,
            is_primary: false,
            is_shown: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.is_shown = false;
        self
    }
}

/// Provider declaration: one extension and the contexts produced for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedExtensionContexts {
    pub input_extension: String,
    pub contexts: Vec<ExtendedContext>,
}

impl SupportedExtensionContexts {
    pub fn new(input_extension: impl Into<String>, contexts: Vec<ExtendedContext>) -> Self {
        Self {
            input_extension: input_extension.into(),
            contexts,
        }
    }
}

/// Executor declaration for one `(extension, context)` pair
#[derive(Clone)]
pub struct ExecutorConfiguration {
    pub input_extension: String,
    pub context: Context,
    pub output_formats: Vec<OutputFormat>,
    /// Factory for the dialog widget; also the source of default parameters
    pub configuration_widget: Option<Arc<dyn ConfigurationWidgetFactory>>,
    pub requires_cwd: bool,
    /// Lower runs first; ties are broken by registration order
    pub priority: i32,
}

impl fmt::Debug for ExecutorConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorConfiguration")
            .field("input_extension", &self.input_extension)
            .field("context", &self.context)
            .field("output_formats", &self.output_formats)
            .field(
                "configuration_widget",
                &self.configuration_widget.as_ref().map(|_| "<factory>"),
            )
            .field("requires_cwd", &self.requires_cwd)
            .field("priority", &self.priority)
            .finish()
    }
}

impl ExecutorConfiguration {
    pub fn new(input_extension: impl Into<String>, context: Context, priority: i32) -> Self {
        Self {
            input_extension: input_extension.into(),
            context,
            output_formats: Vec::new(),
            configuration_widget: None,
            requires_cwd: false,
            priority,
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_formats.push(format);
        self
    }

    pub fn with_widget(mut self, factory: Arc<dyn ConfigurationWidgetFactory>) -> Self {
        self.configuration_widget = Some(factory);
        self
    }

    pub fn requiring_cwd(mut self) -> Self {
        self.requires_cwd = true;
        self
    }

    pub fn input_key(&self) -> (String, String) {
        (self.input_extension.clone(), self.context.id())
    }
}
