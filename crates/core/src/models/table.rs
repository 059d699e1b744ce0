//! Flat view of every stored parameter set, for managing presets
//!
//! Rows are keyed by `(extension, context, parameter-uuid)`. The table is
//! read-only; edits go through the parameter store.

use serde::Serialize;
use std::cmp::Ordering;

use crate::impl_case_insensitive_deserialize;
use crate::run_core::RunCore;
use crate::types::ParameterSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    Extension,
    Context,
    Name,
}

impl_case_insensitive_deserialize!(
    SortColumn,
    Extension => "extension",
    Extension => "ext",
    Context => "context",
    Name => "name"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl_case_insensitive_deserialize!(
    SortOrder,
    Ascending => "ascending",
    Ascending => "asc",
    Descending => "descending",
    Descending => "desc"
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub extension: String,
    pub context: String,
    pub parameters_uuid: String,
    pub executor_id: String,
    pub name: String,
    pub is_default: bool,
    pub is_global: bool,
    pub artifact_uuid: Option<String>,
}

impl From<&ParameterSet> for TableRow {
    fn from(params: &ParameterSet) -> Self {
        Self {
            extension: params.extension.clone(),
            context: params.context.clone(),
            parameters_uuid: params.uuid.clone(),
            executor_id: params.executor_id.clone(),
            name: params.name.clone(),
            is_default: params.is_default,
            is_global: params.is_global,
            artifact_uuid: params.artifact_uuid.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParametersTable {
    executor: Option<String>,
    column: SortColumn,
    order: SortOrder,
    rows: Vec<TableRow>,
}

impl ParametersTable {
    pub fn new(core: &RunCore) -> Self {
        let mut table = Self::default();
        table.refresh(core);
        table
    }

    /// Restrict the table to one executor's parameter sets
    pub fn with_executor(mut self, core: &RunCore, executor_id: impl Into<String>) -> Self {
        self.executor = Some(executor_id.into());
        self.refresh(core);
        self
    }

    pub fn refresh(&mut self, core: &RunCore) {
        self.rows = core
            .all_parameters()
            .filter(|p| self.executor.as_deref().is_none_or(|id| p.executor_id == id))
            .map(TableRow::from)
            .collect();
        self.apply_sort();
    }

    pub fn sort_by(&mut self, column: SortColumn, order: SortOrder) {
        self.column = column;
        self.order = order;
        self.apply_sort();
    }

    fn apply_sort(&mut self) {
        let column = self.column;
        let compare = move |a: &TableRow, b: &TableRow| -> Ordering {
            match column {
                SortColumn::Extension => a.extension.cmp(&b.extension),
                SortColumn::Context => a.context.cmp(&b.context),
                SortColumn::Name => a.name.cmp(&b.name),
            }
        };
        match self.order {
            SortOrder::Ascending => self.rows.sort_by(compare),
            SortOrder::Descending => self.rows.sort_by(|a, b| compare(b, a)),
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// `(extension, context, parameter-uuid)` of a row
    pub fn row_key(&self, index: usize) -> Option<(&str, &str, &str)> {
        self.rows.get(index).map(|row| {
            (
                row.extension.as_str(),
                row.context.as_str(),
                row.parameters_uuid.as_str(),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
