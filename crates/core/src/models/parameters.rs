use crate::run_core::RunCore;
use crate::types::{ParameterKey, ParameterSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    pub uuid: String,
    pub name: String,
    pub is_default: bool,
    pub is_global: bool,
    /// The Default row cannot be edited or deleted
    pub read_only: bool,
}

impl From<&ParameterSet> for ParameterRow {
    fn from(params: &ParameterSet) -> Self {
        Self {
            uuid: params.uuid.clone(),
            name: params.name.clone(),
            is_default: params.is_default,
            is_global: params.is_global,
            read_only: params.is_default,
        }
    }
}

/// Parameter sets for the current triple and artifact, Default first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParametersModel {
    key: Option<ParameterKey>,
    rows: Vec<ParameterRow>,
    current: Option<usize>,
}

impl ParametersModel {
    /// Rebuild the rows and select the Default row
    pub fn reset(&mut self, core: &RunCore, key: ParameterKey, artifact_uuid: Option<&str>) {
        self.rows = core
            .list_parameters(&key.executor_id, &key.extension, &key.context, artifact_uuid)
            .iter()
            .map(ParameterRow::from)
            .collect();
        self.key = Some(key);
        self.current = if self.rows.is_empty() { None } else { Some(0) };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn key(&self) -> Option<&ParameterKey> {
        self.key.as_ref()
    }

    pub fn rows(&self) -> &[ParameterRow] {
        &self.rows
    }

    pub fn current(&self) -> Option<&ParameterRow> {
        self.current.and_then(|index| self.rows.get(index))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn set_current(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        self.current = Some(index);
        true
    }

    pub fn select_uuid(&mut self, uuid: &str) -> bool {
        match self.rows.iter().position(|row| row.uuid == uuid) {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => false,
        }
    }
}
