//! Provider exposing files on disk as runnable artifacts
//!
//! Each file is a primary `File` artifact. Python files also expose their
//! `# %%` cells, and every supported file exposes the current selection.
//! The provider tracks the focused file and a cursor so derived contexts
//! know which lines to hand out.

use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;
use uuid::Uuid;

use runbridge_core::types::run_context;
use runbridge_core::{
    Context, Error, ExtendedContext, Result, RunConfiguration, RunConfigurationMetadata,
    RunConfigurationProvider, SupportedExtensionContexts,
};

pub const PROVIDER_ID: &str = "files";

const CELL_MARKER: &str = "# %%";

/// Extensions the provider announces, in declaration order
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["py", "sh", "bat", "ps1"];

/// Lines the derived contexts operate on, 1-based and inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Line(usize),
    Range(usize, usize),
}

/// A `# %%` delimited block of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub index: usize,
    pub name: String,
    pub start: usize,
    pub end: usize,
}

fn push_cell(cells: &mut Vec<Cell>, name: &str, start: usize, end: usize) {
    if end < start {
        return;
    }
    let index = cells.len();
    cells.push(Cell {
        index,
        name: if name.is_empty() {
            format!("Cell {index}")
        } else {
            name.to_string()
        },
        start,
        end,
    });
}

/// Split `content` into cells. Lines before the first marker form cell 0
/// when they are not blank.
pub fn cells(content: &str) -> Vec<Cell> {
    let lines: Vec<&str> = content.lines().collect();
    let mut cells = Vec::new();
    let mut start = 1;
    let mut name = String::new();

    for (i, line) in lines.iter().enumerate() {
        let number = i + 1;
        if let Some(title) = line.trim_start().strip_prefix(CELL_MARKER) {
            let blank_preamble =
                cells.is_empty() && name.is_empty() && lines[..i].iter().all(|l| l.trim().is_empty());
            if !blank_preamble {
                push_cell(&mut cells, &name, start, number - 1);
            }
            name = title.trim().to_string();
            start = number;
        }
    }
    push_cell(&mut cells, &name, start, lines.len());
    cells
}

struct OpenFile {
    metadata: RunConfigurationMetadata,
    content: String,
}

#[derive(Default)]
pub struct FileProvider {
    files: RwLock<HashMap<String, OpenFile>>,
    focused: Mutex<Option<String>>,
    cursor: Mutex<Option<Cursor>>,
    last_inputs: Mutex<HashMap<String, RunConfiguration>>,
}

impl FileProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Contexts declared for every supported extension
    pub fn supported() -> Vec<SupportedExtensionContexts> {
        SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| {
                let mut contexts = vec![ExtendedContext::primary(Context::new("File"))];
                if *ext == "py" {
                    contexts.push(ExtendedContext::derived(Context::new("Cell")));
                }
                contexts.push(ExtendedContext::derived(Context::new("Selection")));
                SupportedExtensionContexts::new(*ext, contexts)
            })
            .collect()
    }

    /// Stable artifact uuid of a path
    pub fn artifact_uuid(path: &Path) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, path.to_string_lossy().as_bytes()).to_string()
    }

    /// Read `path` and return the metadata to register for it
    pub fn open(&self, path: &Path) -> Result<RunConfigurationMetadata> {
        let path = fs::canonicalize(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .filter(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| {
                Error::ConfigError(format!("{} is not a supported file type", path.display()))
            })?;
        let content = fs::read_to_string(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let metadata = RunConfigurationMetadata::new(
            Self::artifact_uuid(&path),
            name,
            PROVIDER_ID,
            &path,
            extension,
            Context::new("File"),
        );
        debug!("Opened {} as {}", path.display(), metadata.uuid);
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(metadata.uuid.clone(), OpenFile {
                metadata: metadata.clone(),
                content,
            });
        Ok(metadata)
    }

    pub fn set_cursor(&self, cursor: Option<Cursor>) {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = cursor;
    }

    pub fn focused(&self) -> Option<String> {
        self.focused
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record focus moved by the provider itself
    pub fn focus(&self, uuid: &str) {
        *self.focused.lock().unwrap_or_else(PoisonError::into_inner) = Some(uuid.to_string());
    }

    fn derived_input(
        &self,
        context: &str,
        action_name: Option<&str>,
    ) -> Option<RunConfiguration> {
        let uuid = self.focused()?;
        let cursor = (*self.cursor.lock().unwrap_or_else(PoisonError::into_inner))?;
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        let file = files.get(&uuid)?;

        let (label, start, end) = match context {
            run_context::CELL => {
                let line = match cursor {
                    Cursor::Line(line) | Cursor::Range(line, _) => line,
                };
                let cell = cells(&file.content)
                    .into_iter()
                    .find(|cell| cell.start <= line && line <= cell.end)?;
                (cell.name, cell.start, cell.end)
            }
            run_context::SELECTION => match cursor {
                Cursor::Line(line) => (format!("line {line}"), line, line),
                Cursor::Range(start, end) => (format!("lines {start}-{end}"), start, end),
            },
            _ => return None,
        };

        let code: Vec<&str> = file
            .content
            .lines()
            .skip(start.saturating_sub(1))
            .take((end + 1).saturating_sub(start))
            .collect();
        if code.is_empty() {
            return None;
        }

        let mut metadata = file.metadata.clone();
        metadata.name = format!("{} ({})", file.metadata.name, label);
        metadata.context = Context::new(context);
        Some(RunConfiguration::new(
            json!({
                "path": file.metadata.path,
                "code": code.join("\n"),
                "start_line": start,
                "end_line": end,
                "action": action_name,
            }),
            metadata,
        ))
    }
}

impl RunConfigurationProvider for FileProvider {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn get_run_configuration(&self, uuid: &str) -> Result<RunConfiguration> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        let file = files
            .get(uuid)
            .ok_or_else(|| Error::UnknownArtifact(uuid.to_string()))?;
        Ok(RunConfiguration::new(
            json!({ "path": file.metadata.path }),
            file.metadata.clone(),
        ))
    }

    fn get_run_configuration_per_context(
        &self,
        context: &str,
        action_name: Option<&str>,
        re_run: bool,
    ) -> Result<Option<RunConfiguration>> {
        let mut last_inputs = self
            .last_inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if re_run {
            if let Some(previous) = last_inputs.get(context) {
                return Ok(Some(previous.clone()));
            }
        }

        let input = self.derived_input(context, action_name);
        match &input {
            Some(input) => {
                last_inputs.insert(context.to_string(), input.clone());
            }
            None => debug!("Nothing to run for context {}", context),
        }
        Ok(input)
    }

    fn focus_run_configuration(&self, uuid: &str) {
        self.focus(uuid);
    }
}
