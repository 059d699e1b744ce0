//! Priority-ordered executors per `(extension, context)` and their handlers
//!
//! Priorities for a pair are gathered into an insertion-ordered map
//! `executor-id -> priority` and sorted ascending by priority, then by
//! insertion order. The ordering is rebuilt after every registration
//! change so positions stay contiguous.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::interfaces::{RunExecutor, RunHandler};
use crate::types::ExecutorConfiguration;

type InputKey = (String, String);

/// Handler table key; `None` matches any value
type HandlerKey = (Option<String>, Option<String>);

struct ExecutorEntry {
    name: String,
    executor: Weak<dyn RunExecutor>,
    /// Number of `(extension, context)` configurations still registered
    use_count: usize,
    handlers: HashMap<HandlerKey, Arc<dyn RunHandler>>,
}

#[derive(Default)]
struct InputEntry {
    configurations: HashMap<String, ExecutorConfiguration>,
    priorities: IndexMap<String, i32>,
    ordered: Vec<String>,
}

impl InputEntry {
    fn reorder(&mut self) {
        let mut ranked: Vec<(i32, usize, &String)> = self
            .priorities
            .iter()
            .enumerate()
            .map(|(seq, (id, priority))| (*priority, seq, id))
            .collect();
        ranked.sort();
        self.ordered = ranked.into_iter().map(|(_, _, id)| id.clone()).collect();
    }
}

#[derive(Default)]
pub struct ExecutorRegistry {
    executors: IndexMap<String, ExecutorEntry>,
    inputs: IndexMap<InputKey, InputEntry>,
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<_> = self
            .inputs
            .iter()
            .map(|(key, entry)| (key, &entry.ordered))
            .collect();
        f.debug_struct("ExecutorRegistry")
            .field("executors", &self.executors.keys().collect::<Vec<_>>())
            .field("inputs", &inputs)
            .finish()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `executor` into the ordered list of each configured pair.
    ///
    /// Returns the pairs that were not configured for this executor before.
    pub fn register(
        &mut self,
        executor: &Arc<dyn RunExecutor>,
        configurations: &[ExecutorConfiguration],
    ) -> Vec<InputKey> {
        let executor_id = executor.executor_id().to_string();
        let entry = self
            .executors
            .entry(executor_id.clone())
            .or_insert_with(|| ExecutorEntry {
                name: executor.name().to_string(),
                executor: Arc::downgrade(executor),
                use_count: 0,
                handlers: HashMap::new(),
            });

        if entry.use_count == 0 || entry.executor.strong_count() == 0 {
            entry.executor = Arc::downgrade(executor);
            entry.handlers = build_handler_table(executor.as_ref());
        }

        let mut added = Vec::new();
        for config in configurations {
            let key = config.input_key();
            let input = self.inputs.entry(key.clone()).or_default();
            let fresh = input
                .configurations
                .insert(executor_id.clone(), config.clone())
                .is_none();
            // an existing key keeps its registration slot
            input.priorities.insert(executor_id.clone(), config.priority);
            input.reorder();

            if fresh {
                entry.use_count += 1;
                added.push(key.clone());
            }
            tracing::debug!(
                "Executor {} registered for ({}, {}) with priority {}",
                executor_id,
                key.0,
                key.1,
                config.priority
            );
        }
        added
    }

    /// Remove `executor_id` from each configured pair
    pub fn deregister(&mut self, executor_id: &str, configurations: &[ExecutorConfiguration]) {
        for config in configurations {
            self.remove_input(executor_id, &config.input_key());
        }
    }

    /// Remove `executor_id` everywhere, returning the pairs it left
    pub fn deregister_owner(&mut self, executor_id: &str) -> Vec<InputKey> {
        let keys = self.input_keys_of(executor_id);
        for key in &keys {
            self.remove_input(executor_id, key);
        }
        self.executors.shift_remove(executor_id);
        keys
    }

    /// Deregister executors that have been dropped, returning each id
    /// with the pairs it left
    pub fn prune_dead(&mut self) -> Vec<(String, Vec<InputKey>)> {
        let dead: Vec<String> = self
            .executors
            .iter()
            .filter(|(_, entry)| entry.executor.strong_count() == 0)
            .map(|(id, _)| id.clone())
            .collect();
        dead.into_iter()
            .map(|id| {
                let keys = self.deregister_owner(&id);
                (id, keys)
            })
            .collect()
    }

    fn remove_input(&mut self, executor_id: &str, key: &InputKey) {
        let Some(input) = self.inputs.get_mut(key) else {
            return;
        };
        if input.configurations.remove(executor_id).is_none() {
            return;
        }
        input.priorities.shift_remove(executor_id);
        input.reorder();
        if input.priorities.is_empty() {
            self.inputs.shift_remove(key);
        }

        if let Some(entry) = self.executors.get_mut(executor_id) {
            entry.use_count = entry.use_count.saturating_sub(1);
            if entry.use_count == 0 {
                tracing::debug!("Executor {} has no configurations left", executor_id);
                self.executors.shift_remove(executor_id);
            }
        }
        tracing::debug!(
            "Executor {} deregistered from ({}, {})",
            executor_id,
            key.0,
            key.1
        );
    }

    /// Live executors for a pair, best first
    pub fn executors_for(&self, extension: &str, context: &str) -> Vec<String> {
        self.input(extension, context)
            .map(|input| {
                input
                    .ordered
                    .iter()
                    .filter(|id| self.is_alive(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Position of an executor in [`Self::executors_for`]
    pub fn position(&self, executor_id: &str, extension: &str, context: &str) -> Option<usize> {
        self.executors_for(extension, context)
            .iter()
            .position(|id| id == executor_id)
    }

    pub fn default_executor_for(&self, extension: &str, context: &str) -> Option<String> {
        self.executors_for(extension, context).into_iter().next()
    }

    pub fn supports(&self, executor_id: &str, extension: &str, context: &str) -> bool {
        self.configuration(executor_id, extension, context).is_some() && self.is_alive(executor_id)
    }

    pub fn configuration(
        &self,
        executor_id: &str,
        extension: &str,
        context: &str,
    ) -> Option<&ExecutorConfiguration> {
        self.input(extension, context)
            .and_then(|input| input.configurations.get(executor_id))
    }

    /// Resolve the handler for a pair: exact, `(ext, *)`, `(*, ctx)`, `(*, *)`
    pub fn resolve_handler(
        &self,
        executor_id: &str,
        extension: &str,
        context: &str,
    ) -> Result<Arc<dyn RunHandler>> {
        let no_handler = || Error::NoHandler {
            executor: executor_id.to_string(),
            extension: extension.to_string(),
            context: context.to_string(),
        };
        let entry = self.executors.get(executor_id).ok_or_else(no_handler)?;

        let ext = Some(extension.to_string());
        let ctx = Some(context.to_string());
        let candidates: [HandlerKey; 4] = [
            (ext.clone(), ctx.clone()),
            (ext, None),
            (None, ctx),
            (None, None),
        ];
        candidates
            .iter()
            .find_map(|key| entry.handlers.get(key).cloned())
            .ok_or_else(no_handler)
    }

    pub fn has_handler(&self, executor_id: &str, extension: &str, context: &str) -> bool {
        self.resolve_handler(executor_id, extension, context).is_ok()
    }

    pub fn executor(&self, executor_id: &str) -> Option<Arc<dyn RunExecutor>> {
        self.executors
            .get(executor_id)
            .and_then(|entry| entry.executor.upgrade())
    }

    pub fn executor_name(&self, executor_id: &str) -> Option<&str> {
        self.executors.get(executor_id).map(|entry| entry.name.as_str())
    }

    /// Number of configurations keeping the executor registered
    pub fn use_count(&self, executor_id: &str) -> usize {
        self.executors.get(executor_id).map_or(0, |entry| entry.use_count)
    }

    /// Registered executor ids in registration order
    pub fn executor_ids(&self) -> Vec<String> {
        self.executors.keys().cloned().collect()
    }

    pub fn input_keys_of(&self, executor_id: &str) -> Vec<InputKey> {
        self.inputs
            .iter()
            .filter(|(_, input)| input.configurations.contains_key(executor_id))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Every pair with at least one executor
    pub fn input_keys(&self) -> Vec<InputKey> {
        self.inputs.keys().cloned().collect()
    }

    fn input(&self, extension: &str, context: &str) -> Option<&InputEntry> {
        self.inputs.get(&(extension.to_string(), context.to_string()))
    }

    fn is_alive(&self, executor_id: &str) -> bool {
        self.executors
            .get(executor_id)
            .is_some_and(|entry| entry.executor.strong_count() > 0)
    }
}

fn build_handler_table(executor: &dyn RunExecutor) -> HashMap<HandlerKey, Arc<dyn RunHandler>> {
    let mut table = HashMap::new();
    for route in executor.handler_routes() {
        let extensions: Vec<Option<String>> = if route.extensions.is_empty() {
            vec![None]
        } else {
            route.extensions.iter().cloned().map(Some).collect()
        };
        let contexts: Vec<Option<String>> = if route.contexts.is_empty() {
            vec![None]
        } else {
            route.contexts.iter().cloned().map(Some).collect()
        };

        for ext in &extensions {
            for ctx in &contexts {
                let key = (ext.clone(), ctx.clone());
                if table.insert(key, route.handler.clone()).is_some() {
                    tracing::warn!(
                        "Executor {} declares several handlers for ({}, {})",
                        executor.executor_id(),
                        ext.as_deref().unwrap_or("*"),
                        ctx.as_deref().unwrap_or("*")
                    );
                }
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{ExecutorError, HandlerRoute};
    use crate::types::{Context, ExtendedRunParameters, PossibleRunResult, RunConfiguration};

    struct NamedHandler(&'static str);

    impl RunHandler for NamedHandler {
        fn name(&self) -> &str {
            self.0
        }

        fn execute(
            &self,
            _input: &RunConfiguration,
            _params: &ExtendedRunParameters,
        ) -> std::result::Result<Vec<PossibleRunResult>, ExecutorError> {
            Ok(Vec::new())
        }
    }

    struct TestExecutor {
        id: &'static str,
        routes: Vec<HandlerRoute>,
    }

    impl TestExecutor {
        fn catch_all(id: &'static str) -> Arc<dyn RunExecutor> {
            Arc::new(Self {
                id,
                routes: vec![HandlerRoute::any(Arc::new(NamedHandler("any")))],
            })
        }
    }

    impl RunExecutor for TestExecutor {
        fn executor_id(&self) -> &str {
            self.id
        }

        fn handler_routes(&self) -> Vec<HandlerRoute> {
            self.routes.clone()
        }
    }

    fn py_file(priority: i32) -> ExecutorConfiguration {
        ExecutorConfiguration::new("py", Context::new("File"), priority)
    }

    #[test]
    fn test_priority_ordering_with_ties() {
        let mut registry = ExecutorRegistry::new();
        let x1 = TestExecutor::catch_all("X1");
        let x2 = TestExecutor::catch_all("X2");
        let x3 = TestExecutor::catch_all("X3");
        registry.register(&x1, &[py_file(0)]);
        registry.register(&x2, &[py_file(1)]);
        registry.register(&x3, &[py_file(0)]);

        assert_eq!(registry.executors_for("py", "file"), vec!["X1", "X3", "X2"]);
        assert_eq!(registry.position("X2", "py", "file"), Some(2));

        let x4 = TestExecutor::catch_all("X4");
        registry.register(&x4, &[py_file(-1)]);
        assert_eq!(registry.default_executor_for("py", "file").as_deref(), Some("X4"));
    }

    #[test]
    fn test_reregistering_keeps_tie_break_position() {
        let mut registry = ExecutorRegistry::new();
        let x1 = TestExecutor::catch_all("X1");
        let x3 = TestExecutor::catch_all("X3");
        registry.register(&x1, &[py_file(0)]);
        registry.register(&x3, &[py_file(0)]);

        let added = registry.register(&x1, &[py_file(0)]);
        assert!(added.is_empty());
        assert_eq!(registry.executors_for("py", "file"), vec!["X1", "X3"]);
        assert_eq!(registry.use_count("X1"), 1);

        // a new priority reorders but the slot still breaks ties
        registry.register(&x3, &[py_file(-1)]);
        assert_eq!(registry.executors_for("py", "file"), vec!["X3", "X1"]);
        registry.register(&x3, &[py_file(0)]);
        assert_eq!(registry.executors_for("py", "file"), vec!["X1", "X3"]);
    }

    #[test]
    fn test_register_then_deregister_restores_list() {
        let mut registry = ExecutorRegistry::new();
        let x1 = TestExecutor::catch_all("X1");
        let x2 = TestExecutor::catch_all("X2");
        registry.register(&x1, &[py_file(0)]);
        let before = registry.executors_for("py", "file");

        registry.register(&x2, &[py_file(0)]);
        registry.deregister("X2", &[py_file(0)]);
        assert_eq!(registry.executors_for("py", "file"), before);
        assert_eq!(registry.use_count("X2"), 0);
        assert!(registry.executor_name("X2").is_none());
    }

    #[test]
    fn test_use_count_tracks_configurations() {
        let mut registry = ExecutorRegistry::new();
        let x1 = TestExecutor::catch_all("X1");
        let selection = ExecutorConfiguration::new("py", Context::new("Selection"), 0);
        let added = registry.register(&x1, &[py_file(0), selection.clone()]);
        assert_eq!(added.len(), 2);
        assert_eq!(registry.use_count("X1"), 2);

        assert!(registry.register(&x1, &[py_file(0)]).is_empty());
        assert_eq!(registry.use_count("X1"), 2);

        registry.deregister("X1", &[py_file(0)]);
        assert!(registry.has_handler("X1", "py", "selection"));
        registry.deregister("X1", &[selection]);
        assert!(!registry.has_handler("X1", "py", "selection"));
    }

    #[test]
    fn test_handler_resolution_order() {
        let executor: Arc<dyn RunExecutor> = Arc::new(TestExecutor {
            id: "X1",
            routes: vec![
                HandlerRoute::new(Some("py"), Some("file"), Arc::new(NamedHandler("exact"))),
                HandlerRoute::new(Some("py"), None, Arc::new(NamedHandler("ext"))),
                HandlerRoute::new(None, Some("cell"), Arc::new(NamedHandler("ctx"))),
            ],
        });
        let mut registry = ExecutorRegistry::new();
        registry.register(&executor, &[py_file(0)]);

        let name = |ext: &str, ctx: &str| {
            registry
                .resolve_handler("X1", ext, ctx)
                .map(|h| h.name().to_string())
        };
        assert_eq!(name("py", "file").unwrap(), "exact");
        assert_eq!(name("py", "selection").unwrap(), "ext");
        assert_eq!(name("ipy", "cell").unwrap(), "ctx");
        assert!(matches!(name("sh", "file"), Err(Error::NoHandler { .. })));
    }

    #[test]
    fn test_dropped_executor_disappears() {
        let mut registry = ExecutorRegistry::new();
        let x1 = TestExecutor::catch_all("X1");
        let x2 = TestExecutor::catch_all("X2");
        registry.register(&x1, &[py_file(0)]);
        registry.register(&x2, &[py_file(1)]);

        drop(x1);
        assert_eq!(registry.executors_for("py", "file"), vec!["X2"]);
        assert!(!registry.supports("X1", "py", "file"));
        assert_eq!(
            registry.prune_dead(),
            vec![("X1".to_string(), vec![("py".to_string(), "file".to_string())])]
        );
        assert_eq!(registry.executor_ids(), vec!["X2".to_string()]);
    }

    #[test]
    fn test_unregistered_pair_is_empty() {
        let registry = ExecutorRegistry::new();
        assert!(registry.executors_for("py", "file").is_empty());
        assert!(registry.default_executor_for("py", "file").is_none());
    }
}
