//! Built-in executors turning run inputs into interpreter commands

use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info};

use runbridge_core::types::result_format;
use runbridge_core::{
    Context, DefaultsFactory, ExecutorConfiguration, ExecutorError, ExtendedRunParameters,
    HandlerRoute, OutputFormat, PossibleRunResult, RunConfiguration, RunExecutionMetadata,
    RunExecutor, RunHandler, RunResult,
};

use super::command::{Interpreter, ShellCommand, split_args};

pub const PYTHON_CONSOLE: &str = "python-console";
pub const EXTERNAL_TERMINAL: &str = "external-terminal";

/// Whether handlers spawn the command or only report it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Execute,
    DryRun,
}

fn string_param<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

/// Build the interpreter command for a run input
pub fn build_command(
    input: &RunConfiguration,
    params: &ExtendedRunParameters,
) -> Result<ShellCommand, ExecutorError> {
    let extension = input.metadata.input_extension.as_str();
    let interpreter = Interpreter::for_extension(extension).ok_or_else(|| {
        ExecutorError::new(format!("no interpreter is known for '{extension}' files"))
    })?;

    let options = &params.executor_params;
    let program = string_param(options, "interpreter");
    let mut interpreter_opts = string_param(options, "interpreter_opts")
        .map(split_args)
        .unwrap_or_default();
    if interpreter == Interpreter::Python
        && options.get("interact").and_then(Value::as_bool) == Some(true)
    {
        interpreter_opts.push("-i".to_string());
    }

    let command = match input.run_input.get("code").and_then(Value::as_str) {
        Some(code) => ShellCommand::inline(&interpreter, program, &interpreter_opts, code),
        None => {
            let path = input
                .run_input
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| ExecutorError::new("run input carries no path"))?;
            let script_args = string_param(options, "args")
                .map(split_args)
                .unwrap_or_default();
            ShellCommand::script(&interpreter, program, &interpreter_opts, path, &script_args)
        }
    };

    Ok(command
        .with_working_dir(params.working_dir.clone())
        .with_env("RUNBRIDGE_ARTIFACT".to_string(), input.metadata.uuid.clone()))
}

/// Handler shared by the built-in executors
pub struct CommandHandler {
    executor_id: &'static str,
    mode: RunMode,
}

impl RunHandler for CommandHandler {
    fn name(&self) -> &str {
        self.executor_id
    }

    fn execute(
        &self,
        input: &RunConfiguration,
        params: &ExtendedRunParameters,
    ) -> Result<Vec<PossibleRunResult>, ExecutorError> {
        let command = build_command(input, params)?;
        let shell_cmd = command.to_shell_command();
        let mut execution = RunExecutionMetadata::started(self.executor_id);
        execution
            .extra
            .insert("parameters".to_string(), json!(params.params.name));

        let mut output = json!({
            "command": shell_cmd,
            "working_dir": command.working_dir,
            "env": command.env.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>(),
        });
        let mut is_error = false;

        match self.mode {
            RunMode::DryRun => debug!("Dry run of {}", shell_cmd),
            RunMode::Execute => {
                info!("Running: {}", shell_cmd);
                let result = command.execute().map_err(|e| {
                    ExecutorError::new(format!("failed to execute {}: {}", command.program, e))
                })?;
                let exit_code = result.status.code().unwrap_or(1);
                is_error = !result.status.success();
                output["stdout"] = json!(String::from_utf8_lossy(&result.stdout));
                output["stderr"] = json!(String::from_utf8_lossy(&result.stderr));
                output["exit_code"] = json!(exit_code);
            }
        }

        Ok(vec![PossibleRunResult::from(RunResult {
            output_format: result_format::TEXT.to_string(),
            run_output: output,
            input_extension: input.metadata.input_extension.clone(),
            metadata: input.metadata.clone(),
            execution_metadata: execution.finish(),
            is_error,
        })])
    }
}

/// Runs Python files, cells and selections in a Python interpreter
pub struct PythonConsole {
    handler: Arc<CommandHandler>,
}

impl PythonConsole {
    pub fn new(mode: RunMode) -> Arc<Self> {
        Arc::new(Self {
            handler: Arc::new(CommandHandler {
                executor_id: PYTHON_CONSOLE,
                mode,
            }),
        })
    }

    pub fn configurations() -> Vec<ExecutorConfiguration> {
        let defaults = Arc::new(DefaultsFactory::from_value(json!({
            "interpreter": "",
            "interpreter_opts": "",
            "args": "",
            "interact": false,
        })));
        ["File", "Cell", "Selection"]
            .into_iter()
            .map(|context| {
                ExecutorConfiguration::new("py", Context::new(context), 0)
                    .with_output_format(OutputFormat::new("Text"))
                    .with_widget(defaults.clone())
            })
            .collect()
    }
}

impl RunExecutor for PythonConsole {
    fn executor_id(&self) -> &str {
        PYTHON_CONSOLE
    }

    fn name(&self) -> &str {
        "Python console"
    }

    fn handler_routes(&self) -> Vec<HandlerRoute> {
        vec![HandlerRoute::new(Some("py"), None, self.handler.clone())]
    }
}

/// Runs whole files in a system terminal; needs a working directory
pub struct ExternalTerminal {
    handler: Arc<CommandHandler>,
}

impl ExternalTerminal {
    pub fn new(mode: RunMode) -> Arc<Self> {
        Arc::new(Self {
            handler: Arc::new(CommandHandler {
                executor_id: EXTERNAL_TERMINAL,
                mode,
            }),
        })
    }

    pub fn configurations() -> Vec<ExecutorConfiguration> {
        let defaults = Arc::new(DefaultsFactory::from_value(json!({
            "interpreter": "",
            "interpreter_opts": "",
            "args": "",
        })));
        ["py", "sh", "bat", "ps1"]
            .into_iter()
            .map(|extension| {
                ExecutorConfiguration::new(extension, Context::new("File"), 1)
                    .with_output_format(OutputFormat::new("Text"))
                    .with_widget(defaults.clone())
                    .requiring_cwd()
            })
            .collect()
    }
}

impl RunExecutor for ExternalTerminal {
    fn executor_id(&self) -> &str {
        EXTERNAL_TERMINAL
    }

    fn name(&self) -> &str {
        "External terminal"
    }

    fn handler_routes(&self) -> Vec<HandlerRoute> {
        vec![HandlerRoute::any(self.handler.clone())]
    }
}
