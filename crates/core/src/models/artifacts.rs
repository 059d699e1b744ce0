use std::path::PathBuf;

use crate::run_core::RunCore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRow {
    pub uuid: String,
    pub name: String,
    pub source: String,
    pub path: PathBuf,
    pub extension: String,
    pub context: String,
}

/// Artifacts in registration order; the selected row follows focus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactsModel {
    rows: Vec<ArtifactRow>,
    selected: Option<usize>,
}

impl ArtifactsModel {
    pub fn new(core: &RunCore) -> Self {
        let mut model = Self::default();
        model.refresh(core);
        model
    }

    /// Reload rows and move the selection to the focused artifact
    pub fn refresh(&mut self, core: &RunCore) {
        self.rows = core
            .artifacts()
            .map(|m| ArtifactRow {
                uuid: m.uuid.clone(),
                name: m.name.clone(),
                source: m.source.clone(),
                path: m.path.clone(),
                extension: m.input_extension.clone(),
                context: m.context_id(),
            })
            .collect();
        self.selected = core
            .focused()
            .and_then(|uuid| self.rows.iter().position(|row| row.uuid == uuid));
    }

    pub fn rows(&self) -> &[ArtifactRow] {
        &self.rows
    }

    pub fn selected(&self) -> Option<&ArtifactRow> {
        self.selected.and_then(|index| self.rows.get(index))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
