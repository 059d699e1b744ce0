//! Reference host wiring the Run core to files, interpreters and stdout

pub mod command;
pub mod executors;
pub mod provider;
pub mod viewer;

pub use command::{Interpreter, ShellCommand};
pub use executors::{EXTERNAL_TERMINAL, ExternalTerminal, PYTHON_CONSOLE, PythonConsole, RunMode};
pub use provider::{Cursor, FileProvider, PROVIDER_ID};
pub use viewer::StdoutViewer;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use runbridge_core::{
    ConfigStore, JsonFileStore, OutputFormat, RunConfigurationProvider, RunCore, RunExecutor,
    RunResultViewer, RunSettings, SettingsEnv,
};

use crate::utils::{Location, Target};

const HOST_SECTION: &str = "host";
const LAST_RUN_KEY: &str = "last_run";

/// Invocation replayed by `rerun`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRun {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

pub struct Host {
    pub core: RunCore,
    pub files: Arc<FileProvider>,
    state: JsonFileStore,
    // keep the registered plugins alive for the lifetime of the host
    _python: Arc<PythonConsole>,
    _terminal: Arc<ExternalTerminal>,
    _viewer: Arc<StdoutViewer>,
}

impl Host {
    /// Load settings from the working directory and register the built-in
    /// provider, executors and viewer
    pub fn start(mode: RunMode) -> Result<Self> {
        let env = SettingsEnv::from_env();
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let settings = RunSettings::discover(&cwd, &env)?;
        let store_path = settings.resolved_store_path(&env);
        debug!("Using run store at {:?}", store_path);
        Self::with_store(settings, store_path, mode)
    }

    pub fn with_store(settings: RunSettings, store_path: PathBuf, mode: RunMode) -> Result<Self> {
        let state_path = store_path.with_file_name("host-state.json");
        let store = JsonFileStore::open(&store_path)
            .with_context(|| format!("Failed to open run store {}", store_path.display()))?;
        let state = JsonFileStore::open(&state_path)
            .with_context(|| format!("Failed to open host state {}", state_path.display()))?;
        let mut core = RunCore::init(settings, Box::new(store));

        let files = FileProvider::new();
        let provider: Arc<dyn RunConfigurationProvider> = files.clone();
        core.register_provider_configuration(&provider, &FileProvider::supported())?;

        let python = PythonConsole::new(mode);
        let executor: Arc<dyn RunExecutor> = python.clone();
        core.register_executor_configuration(&executor, &PythonConsole::configurations())?;

        let terminal = ExternalTerminal::new(mode);
        let executor: Arc<dyn RunExecutor> = terminal.clone();
        core.register_executor_configuration(&executor, &ExternalTerminal::configurations())?;

        let viewer = Arc::new(StdoutViewer);
        let as_viewer: Arc<dyn RunResultViewer> = viewer.clone();
        core.register_viewer(&as_viewer, &[OutputFormat::new("Text")])?;

        Ok(Self {
            core,
            files,
            state,
            _python: python,
            _terminal: terminal,
            _viewer: viewer,
        })
    }

    /// Register the target's file, move the cursor and focus it.
    ///
    /// Returns the artifact uuid and the context identifier to run.
    pub fn open(&mut self, target: &Target) -> Result<(String, String)> {
        let metadata = self
            .files
            .open(&target.path)
            .with_context(|| format!("Failed to open {}", target.path.display()))?;
        let uuid = metadata.uuid.clone();
        let provider: Arc<dyn RunConfigurationProvider> = self.files.clone();
        if self.core.metadata(&uuid).is_none() {
            self.core
                .register_run_configuration_metadata(&provider, metadata)?;
        }

        let cursor = match target.location {
            Location::File => None,
            Location::Line(line) => Some(Cursor::Line(line)),
            Location::Range(start, end) => Some(Cursor::Range(start, end)),
        };
        self.files.set_cursor(cursor);
        self.files.focus(&uuid);
        self.core.switch_focus_from(PROVIDER_ID, Some(&uuid));
        Ok((uuid, target.location.context().to_string()))
    }

    pub fn last_run(&self) -> Option<LastRun> {
        self.state
            .get(HOST_SECTION, LAST_RUN_KEY)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn remember(&mut self, last_run: &LastRun) -> Result<()> {
        self.state
            .set(HOST_SECTION, LAST_RUN_KEY, serde_json::to_value(last_run)?);
        self.state.flush().context("Failed to save host state")
    }

    pub fn shutdown(self) -> Result<()> {
        self.core.shutdown().context("Failed to save run store")
    }
}
