//! Dispatch requests and reports

use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::interfaces::RunResultViewer;
use crate::types::{PossibleRunResult, WorkingDirOpts, WorkingDirPolicy};

/// What to run, with what, and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub artifact_uuid: String,
    pub executor_id: String,
    pub parameters_uuid: String,
    /// Context to run; the artifact's own context when `None`
    pub context: Option<String>,
    /// Action tag forwarded to the provider for derived contexts
    pub action: Option<String>,
    /// Ask the provider for the same input as last time
    pub re_run: bool,
}

impl DispatchRequest {
    pub fn new(
        artifact_uuid: impl Into<String>,
        executor_id: impl Into<String>,
        parameters_uuid: impl Into<String>,
    ) -> Self {
        Self {
            artifact_uuid: artifact_uuid.into(),
            executor_id: executor_id.into(),
            parameters_uuid: parameters_uuid.into(),
            context: None,
            action: None,
            re_run: false,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn re_run(mut self, re_run: bool) -> Self {
        self.re_run = re_run;
        self
    }
}

/// Outcome of a successful dispatch
pub struct DispatchReport {
    pub artifact_uuid: String,
    pub executor_id: String,
    pub parameters_uuid: String,
    pub context: String,
    pub working_dir: Option<PathBuf>,
    pub results: Vec<PossibleRunResult>,
    /// Live viewers per output format found among `results`
    pub viewers: IndexMap<String, Vec<Arc<dyn RunResultViewer>>>,
}

impl fmt::Debug for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let viewers: Vec<_> = self
            .viewers
            .iter()
            .map(|(format, viewers)| {
                let ids: Vec<&str> = viewers.iter().map(|v| v.viewer_id()).collect();
                (format, ids)
            })
            .collect();
        f.debug_struct("DispatchReport")
            .field("artifact_uuid", &self.artifact_uuid)
            .field("executor_id", &self.executor_id)
            .field("parameters_uuid", &self.parameters_uuid)
            .field("context", &self.context)
            .field("working_dir", &self.working_dir)
            .field("results", &self.results)
            .field("viewers", &viewers)
            .finish()
    }
}

impl DispatchReport {
    /// Viewers able to render `result`
    pub fn viewers_for(&self, result: &PossibleRunResult) -> &[Arc<dyn RunResultViewer>] {
        result
            .output_format()
            .and_then(|format| self.viewers.get(format))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Hand every displayable result to the viewers of its format
    pub fn display_all(&self) -> usize {
        let mut shown = 0;
        for result in &self.results {
            let PossibleRunResult::Result(run_result) = result else {
                continue;
            };
            if !result.is_displayable() {
                continue;
            }
            for viewer in self.viewers_for(result) {
                viewer.display_run_result(run_result);
                shown += 1;
            }
        }
        shown
    }
}

/// Working directory for a run according to a parameter set's policy
pub fn resolve_working_dir(
    opts: &WorkingDirOpts,
    artifact_path: &Path,
    process_cwd: &Path,
) -> Option<PathBuf> {
    match opts.policy {
        WorkingDirPolicy::FileDir => artifact_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf),
        WorkingDirPolicy::Cwd => Some(process_cwd.to_path_buf()),
        WorkingDirPolicy::Fixed => opts.path.clone(),
    }
}
