use serde_json::Value;
use std::io::Write;

use runbridge_core::{RunResult, RunResultViewer};

pub const STDOUT_VIEWER: &str = "stdout";

/// Prints text results: the command for dry runs, the process output otherwise
#[derive(Debug, Default)]
pub struct StdoutViewer;

impl StdoutViewer {
    /// Text written to stdout and stderr for a result
    pub fn render(result: &RunResult) -> (String, String) {
        let output = &result.run_output;
        let field = |key: &str| output.get(key).and_then(Value::as_str).unwrap_or_default();

        let mut stdout = String::new();
        let mut stderr = String::new();
        match output.get("exit_code") {
            None => {
                stdout.push_str(field("command"));
                stdout.push('\n');
                if let Some(dir) = output.get("working_dir").and_then(Value::as_str) {
                    stdout.push_str(&format!("Working directory: {dir}\n"));
                }
            }
            Some(code) => {
                stdout.push_str(field("stdout"));
                stderr.push_str(field("stderr"));
                if result.is_error {
                    stderr.push_str(&format!("{} exited with status {}\n", result.metadata.name, code));
                }
            }
        }
        (stdout, stderr)
    }
}

impl RunResultViewer for StdoutViewer {
    fn viewer_id(&self) -> &str {
        STDOUT_VIEWER
    }

    fn display_run_result(&self, result: &RunResult) {
        let (stdout, stderr) = Self::render(result);
        print!("{stdout}");
        eprint!("{stderr}");
        std::io::stdout().flush().ok();
    }
}
