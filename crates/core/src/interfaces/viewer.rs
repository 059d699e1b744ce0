use crate::types::RunResult;

/// A component able to render results of some output formats
pub trait RunResultViewer: Send + Sync {
    fn viewer_id(&self) -> &str;

    fn display_run_result(&self, result: &RunResult);
}
