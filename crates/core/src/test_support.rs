//! Mock providers, executors and viewers shared by unit tests

use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::{ConfigStore, MemoryStore};
use crate::error::{Error, Result};
use crate::interfaces::{
    DefaultsFactory, ExecutorError, HandlerRoute, RunConfigurationProvider, RunExecutor,
    RunHandler, RunResultViewer,
};
use crate::run_core::RunCore;
use crate::types::{
    Context, ExecutorConfiguration, ExtendedContext, ExtendedRunParameters, OutputFormat,
    ParameterKey, PossibleRunResult, RunConfiguration, RunConfigurationMetadata,
    RunExecutionMetadata, RunResult, SupportedExtensionContexts, result_format,
};

/// Store whose writes land in memory but never flush
#[derive(Default)]
pub struct FailingStore(MemoryStore);

impl ConfigStore for FailingStore {
    fn get(&self, section: &str, key: &str) -> Option<Value> {
        self.0.get(section, key)
    }
    fn set(&mut self, section: &str, key: &str, value: Value) {
        self.0.set(section, key, value)
    }
    fn remove(&mut self, section: &str, key: &str) -> Option<Value> {
        self.0.remove(section, key)
    }
    fn keys_with_prefix(&self, section: &str, prefix: &str) -> Vec<String> {
        self.0.keys_with_prefix(section, prefix)
    }
    fn flush(&mut self) -> Result<()> {
        Err(Error::IoError(std::io::Error::other("disk full")))
    }
}

/// Call made to `get_run_configuration_per_context`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextCall {
    pub context: String,
    pub action: Option<String>,
    pub re_run: bool,
}

pub struct MockProvider {
    id: String,
    path: PathBuf,
    pub discard_derived: Mutex<bool>,
    pub context_calls: Mutex<Vec<ContextCall>>,
    pub focus_calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            path: PathBuf::from("/work/project/script.py"),
            discard_derived: Mutex::new(false),
            context_calls: Mutex::new(Vec::new()),
            focus_calls: Mutex::new(Vec::new()),
        })
    }

    /// `py` files as primary artifacts, selections and cells as derived ones
    pub fn python_contexts() -> Vec<SupportedExtensionContexts> {
        vec![SupportedExtensionContexts::new(
            "py",
            vec![
                ExtendedContext::primary(Context::new("File")),
                ExtendedContext::derived(Context::new("Selection")),
                ExtendedContext::derived(Context::new("Cell")),
            ],
        )]
    }

    pub fn artifact(&self, uuid: &str) -> RunConfigurationMetadata {
        RunConfigurationMetadata::new(
            uuid,
            "script.py",
            &self.id,
            &self.path,
            "py",
            Context::new("File"),
        )
    }
}

impl RunConfigurationProvider for MockProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn get_run_configuration(&self, uuid: &str) -> Result<RunConfiguration> {
        Ok(RunConfiguration::new(
            json!({ "kind": "file", "uuid": uuid }),
            self.artifact(uuid),
        ))
    }

    fn get_run_configuration_per_context(
        &self,
        context: &str,
        action_name: Option<&str>,
        re_run: bool,
    ) -> Result<Option<RunConfiguration>> {
        self.context_calls.lock().unwrap().push(ContextCall {
            context: context.to_string(),
            action: action_name.map(str::to_string),
            re_run,
        });
        if *self.discard_derived.lock().unwrap() {
            return Ok(None);
        }
        let mut metadata = self.artifact("derived");
        metadata.context = Context::new(context);
        Ok(Some(RunConfiguration::new(
            json!({ "kind": context, "action": action_name }),
            metadata,
        )))
    }

    fn focus_run_configuration(&self, uuid: &str) {
        self.focus_calls.lock().unwrap().push(uuid.to_string());
    }
}

/// Handler recording what it was asked to run
pub struct RecordingHandler {
    name: String,
    pub fail: Mutex<bool>,
    pub runs: Mutex<Vec<(Value, ExtendedRunParameters)>>,
}

impl RecordingHandler {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail: Mutex::new(false),
            runs: Mutex::new(Vec::new()),
        })
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

impl RunHandler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &self,
        input: &RunConfiguration,
        params: &ExtendedRunParameters,
    ) -> std::result::Result<Vec<PossibleRunResult>, ExecutorError> {
        if *self.fail.lock().unwrap() {
            return Err(ExecutorError::with_code(2, "interpreter crashed"));
        }
        self.runs
            .lock()
            .unwrap()
            .push((input.run_input.clone(), params.clone()));
        Ok(vec![PossibleRunResult::from(RunResult {
            output_format: result_format::TEXT.to_string(),
            run_output: json!("ok"),
            input_extension: input.metadata.input_extension.clone(),
            metadata: input.metadata.clone(),
            execution_metadata: RunExecutionMetadata::started(&self.name).finish(),
            is_error: false,
        })])
    }
}

/// Executor with one catch-all handler
pub struct MockExecutor {
    id: String,
    pub handler: Arc<RecordingHandler>,
}

impl MockExecutor {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            handler: RecordingHandler::new(id),
        })
    }

    /// Configuration for `py` in `context` with `{"interact": false, "args": ""}` defaults
    pub fn python_config(context: &str, priority: i32) -> ExecutorConfiguration {
        ExecutorConfiguration::new("py", Context::new(context), priority)
            .with_output_format(OutputFormat::new("Text"))
            .with_widget(Arc::new(DefaultsFactory::from_value(
                json!({ "interact": false, "args": "" }),
            )))
    }
}

impl RunExecutor for MockExecutor {
    fn executor_id(&self) -> &str {
        &self.id
    }

    fn handler_routes(&self) -> Vec<HandlerRoute> {
        vec![HandlerRoute::any(self.handler.clone())]
    }
}

pub struct MockViewer {
    id: String,
    pub shown: Mutex<Vec<Value>>,
}

impl MockViewer {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            shown: Mutex::new(Vec::new()),
        })
    }
}

impl RunResultViewer for MockViewer {
    fn viewer_id(&self) -> &str {
        &self.id
    }

    fn display_run_result(&self, result: &RunResult) {
        self.shown.lock().unwrap().push(result.run_output.clone());
    }
}

pub struct Fixture {
    pub core: RunCore,
    pub provider: Arc<MockProvider>,
    pub x1: Arc<MockExecutor>,
    pub x2: Arc<MockExecutor>,
}

/// Provider `editor` owning `A1` (py/File); X1 runs File and Selection
/// at priority 0, X2 runs File at priority 1
pub fn fixture() -> Fixture {
    let mut core = RunCore::in_memory();
    let provider = MockProvider::new("editor");
    let as_provider: Arc<dyn RunConfigurationProvider> = provider.clone();
    core.register_provider_configuration(&as_provider, &MockProvider::python_contexts())
        .unwrap();

    let x1 = MockExecutor::new("X1");
    let x2 = MockExecutor::new("X2");
    let e1: Arc<dyn RunExecutor> = x1.clone();
    let e2: Arc<dyn RunExecutor> = x2.clone();
    core.register_executor_configuration(
        &e1,
        &[
            MockExecutor::python_config("File", 0),
            MockExecutor::python_config("Selection", 0),
        ],
    )
    .unwrap();
    core.register_executor_configuration(&e2, &[MockExecutor::python_config("File", 1)])
        .unwrap();

    core.register_run_configuration_metadata(&as_provider, provider.artifact("A1"))
        .unwrap();
    Fixture {
        core,
        provider,
        x1,
        x2,
    }
}

pub fn default_of(core: &RunCore, executor_id: &str, context: &str) -> String {
    core.default_parameters(&ParameterKey::new(executor_id, "py", context))
        .unwrap()
        .uuid
        .clone()
}
