//! Interface implemented by executors
//!
//! An executor exposes a table of handler routes. Each route names the
//! extensions and contexts it handles; an empty list matches any value.

use std::fmt;
use std::sync::Arc;

use crate::types::{ExtendedRunParameters, PossibleRunResult, RunConfiguration};

/// Failure reported by a handler, surfaced to the caller verbatim
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutorError {
    pub code: i32,
    pub message: String,
}

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: 1,
            message: message.into(),
        }
    }

    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// One executable handler
pub trait RunHandler: Send + Sync {
    fn name(&self) -> &str;

    fn execute(
        &self,
        input: &RunConfiguration,
        params: &ExtendedRunParameters,
    ) -> Result<Vec<PossibleRunResult>, ExecutorError>;
}

/// Routing entry of an executor's handler table
#[derive(Clone)]
pub struct HandlerRoute {
    /// Extensions handled; empty means any
    pub extensions: Vec<String>,
    /// Context identifiers handled; empty means any
    pub contexts: Vec<String>,
    pub handler: Arc<dyn RunHandler>,
}

impl fmt::Debug for HandlerRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRoute")
            .field("extensions", &self.extensions)
            .field("contexts", &self.contexts)
            .field("handler", &self.handler.name())
            .finish()
    }
}

impl HandlerRoute {
    /// Catch-all route
    pub fn any(handler: Arc<dyn RunHandler>) -> Self {
        Self {
            extensions: Vec::new(),
            contexts: Vec::new(),
            handler,
        }
    }

    pub fn new(extension: Option<&str>, context: Option<&str>, handler: Arc<dyn RunHandler>) -> Self {
        Self {
            extensions: extension.map(|e| vec![e.to_string()]).unwrap_or_default(),
            contexts: context.map(|c| vec![c.to_string()]).unwrap_or_default(),
            handler,
        }
    }

    pub fn for_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn for_contexts(mut self, contexts: &[&str]) -> Self {
        self.contexts = contexts.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// A consumer of run inputs
pub trait RunExecutor: Send + Sync {
    /// Stable identifier, also used as the executor's key in parameter triples
    fn executor_id(&self) -> &str;

    /// Display name
    fn name(&self) -> &str {
        self.executor_id()
    }

    /// Handlers and the `(extension, context)` tuples they serve
    fn handler_routes(&self) -> Vec<HandlerRoute>;
}
