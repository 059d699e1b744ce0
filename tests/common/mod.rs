//! In-memory plugins shared by the integration tests
//!
//! `scripts` owns `.r` files with a primary File context and a derived
//! Selection context. `rscript` runs both at priority 0, `rterm` runs
//! files at priority 5 and needs a working directory.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use runbridge_suite::{
    Context, DefaultsFactory, ExecutorConfiguration, ExecutorError, ExtendedContext,
    ExtendedRunParameters, HandlerRoute, OutputFormat, PossibleRunResult, Result, RunConfiguration,
    RunConfigurationMetadata, RunConfigurationProvider, RunCore, RunExecutionMetadata,
    RunExecutor, RunHandler, RunResult, RunResultViewer, SupportedExtensionContexts,
    result_format,
};

pub struct ScriptProvider {
    scripts: Mutex<HashMap<String, PathBuf>>,
    pub selection: Mutex<String>,
    last_selection: Mutex<Option<RunConfiguration>>,
    focused: Mutex<Option<String>>,
}

impl ScriptProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            selection: Mutex::new(String::new()),
            last_selection: Mutex::new(None),
            focused: Mutex::new(None),
        })
    }

    pub fn contexts() -> Vec<SupportedExtensionContexts> {
        vec![SupportedExtensionContexts::new(
            "r",
            vec![
                ExtendedContext::primary(Context::new("File")),
                ExtendedContext::derived(Context::new("Selection")),
            ],
        )]
    }

    pub fn add(&self, uuid: &str, path: impl AsRef<Path>) -> RunConfigurationMetadata {
        let path = path.as_ref().to_path_buf();
        self.scripts
            .lock()
            .unwrap()
            .insert(uuid.to_string(), path.clone());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        RunConfigurationMetadata::new(uuid, name, "scripts", path, "r", Context::new("File"))
    }

    pub fn focused(&self) -> Option<String> {
        self.focused.lock().unwrap().clone()
    }

    fn metadata(&self, uuid: &str) -> Option<RunConfigurationMetadata> {
        let path = self.scripts.lock().unwrap().get(uuid).cloned()?;
        Some(RunConfigurationMetadata::new(
            uuid,
            "selection",
            "scripts",
            path,
            "r",
            Context::new("Selection"),
        ))
    }
}

impl RunConfigurationProvider for ScriptProvider {
    fn provider_id(&self) -> &str {
        "scripts"
    }

    fn get_run_configuration(&self, uuid: &str) -> Result<RunConfiguration> {
        let path = self
            .scripts
            .lock()
            .unwrap()
            .get(uuid)
            .cloned()
            .ok_or_else(|| runbridge_suite::Error::UnknownArtifact(uuid.to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(RunConfiguration::new(
            json!({ "path": path }),
            RunConfigurationMetadata::new(uuid, name, "scripts", path, "r", Context::new("File")),
        ))
    }

    fn get_run_configuration_per_context(
        &self,
        _context: &str,
        _action_name: Option<&str>,
        re_run: bool,
    ) -> Result<Option<RunConfiguration>> {
        let mut last = self.last_selection.lock().unwrap();
        if re_run && last.is_some() {
            return Ok(last.clone());
        }
        let code = self.selection.lock().unwrap().clone();
        let Some(uuid) = self.focused() else {
            return Ok(None);
        };
        if code.is_empty() {
            return Ok(None);
        }
        let input = self
            .metadata(&uuid)
            .map(|metadata| RunConfiguration::new(json!({ "code": code }), metadata));
        *last = input.clone();
        Ok(input)
    }

    fn focus_run_configuration(&self, uuid: &str) {
        *self.focused.lock().unwrap() = Some(uuid.to_string());
    }
}

/// Handler echoing its input back as a text result
pub struct EchoHandler {
    name: String,
    pub runs: Mutex<Vec<(Value, ExtendedRunParameters)>>,
}

impl RunHandler for EchoHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &self,
        input: &RunConfiguration,
        params: &ExtendedRunParameters,
    ) -> std::result::Result<Vec<PossibleRunResult>, ExecutorError> {
        self.runs
            .lock()
            .unwrap()
            .push((input.run_input.clone(), params.clone()));
        Ok(vec![PossibleRunResult::from(RunResult {
            output_format: result_format::TEXT.to_string(),
            run_output: input.run_input.clone(),
            input_extension: input.metadata.input_extension.clone(),
            metadata: input.metadata.clone(),
            execution_metadata: RunExecutionMetadata::started(&self.name).finish(),
            is_error: false,
        })])
    }
}

pub struct EchoExecutor {
    id: String,
    pub handler: Arc<EchoHandler>,
}

impl EchoExecutor {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            handler: Arc::new(EchoHandler {
                name: id.to_string(),
                runs: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn run_count(&self) -> usize {
        self.handler.runs.lock().unwrap().len()
    }

    pub fn last_run(&self) -> Option<(Value, ExtendedRunParameters)> {
        self.handler.runs.lock().unwrap().last().cloned()
    }
}

impl RunExecutor for EchoExecutor {
    fn executor_id(&self) -> &str {
        &self.id
    }

    fn handler_routes(&self) -> Vec<HandlerRoute> {
        vec![HandlerRoute::any(self.handler.clone())]
    }
}

pub fn r_config(context: &str, priority: i32) -> ExecutorConfiguration {
    ExecutorConfiguration::new("r", Context::new(context), priority)
        .with_output_format(OutputFormat::new("Text"))
        .with_widget(Arc::new(DefaultsFactory::from_value(
            json!({ "vanilla": false, "args": "" }),
        )))
}

#[derive(Default)]
pub struct ConsoleViewer {
    pub shown: Mutex<Vec<Value>>,
}

impl RunResultViewer for ConsoleViewer {
    fn viewer_id(&self) -> &str {
        "console"
    }

    fn display_run_result(&self, result: &RunResult) {
        self.shown.lock().unwrap().push(result.run_output.clone());
    }
}

/// A core with every plugin registered. Keep this value alive for the
/// whole test: the core only holds the plugins weakly.
pub struct Workbench {
    pub core: RunCore,
    pub scripts: Arc<ScriptProvider>,
    pub rscript: Arc<EchoExecutor>,
    pub rterm: Arc<EchoExecutor>,
    pub console: Arc<ConsoleViewer>,
}

impl Workbench {
    pub fn register(mut core: RunCore) -> Self {
        let scripts = ScriptProvider::new();
        let provider: Arc<dyn RunConfigurationProvider> = scripts.clone();
        core.register_provider_configuration(&provider, &ScriptProvider::contexts())
            .unwrap();

        let rscript = EchoExecutor::new("rscript");
        let executor: Arc<dyn RunExecutor> = rscript.clone();
        core.register_executor_configuration(&executor, &[r_config("File", 0), r_config("Selection", 0)])
            .unwrap();

        let rterm = EchoExecutor::new("rterm");
        let executor: Arc<dyn RunExecutor> = rterm.clone();
        core.register_executor_configuration(&executor, &[r_config("File", 5).requiring_cwd()])
            .unwrap();

        let console = Arc::new(ConsoleViewer::default());
        let viewer: Arc<dyn RunResultViewer> = console.clone();
        core.register_viewer(&viewer, &[OutputFormat::new("Text")])
            .unwrap();

        Self {
            core,
            scripts,
            rscript,
            rterm,
            console,
        }
    }

    /// Register a script and focus it
    pub fn open(&mut self, uuid: &str, path: &str) {
        let metadata = self.scripts.add(uuid, path);
        let provider: Arc<dyn RunConfigurationProvider> = self.scripts.clone();
        self.core
            .register_run_configuration_metadata(&provider, metadata)
            .unwrap();
        self.core.switch_focus(Some(uuid));
    }
}
