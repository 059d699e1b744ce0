//! Enablement of the host's run actions for the focused artifact

/// Per-context run action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextAction {
    pub context: String,
    pub is_primary: bool,
    /// Whether the host shows a dedicated action for the context
    pub is_shown: bool,
    /// The provider supports the pair and an executor is registered for it
    pub enabled: bool,
    /// The context was already run for the focused artifact
    pub re_run_enabled: bool,
}

/// "Run in <executor>" action for one context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorAction {
    pub executor_id: String,
    pub context: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStatus {
    pub focused: Option<String>,
    /// Run the focused artifact with its last-used pair
    pub run: bool,
    /// Open the configuration dialog
    pub configure: bool,
    /// Re-run the last executed primary artifact
    pub re_run_last: bool,
    pub contexts: Vec<ContextAction>,
    pub executors: Vec<ExecutorAction>,
}

impl ActionStatus {
    pub fn context(&self, context: &str) -> Option<&ContextAction> {
        self.contexts.iter().find(|action| action.context == context)
    }

    pub fn executor(&self, executor_id: &str, context: &str) -> Option<&ExecutorAction> {
        self.executors
            .iter()
            .find(|action| action.executor_id == executor_id && action.context == context)
    }
}
