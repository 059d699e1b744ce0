use crate::run_core::RunCore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorRow {
    pub executor_id: String,
    pub name: String,
    pub priority: i32,
    /// Position in the priority ordering of the pair
    pub position: usize,
    pub has_handler: bool,
}

/// Executors registered for the selected artifact's `(extension, context)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorsModel {
    input: Option<(String, String)>,
    rows: Vec<ExecutorRow>,
    current: Option<usize>,
}

impl ExecutorsModel {
    /// Rebuild the rows for a pair and select the first one
    pub fn reset(&mut self, core: &RunCore, extension: &str, context: &str) {
        let registry = core.executor_registry();
        self.rows = registry
            .executors_for(extension, context)
            .into_iter()
            .enumerate()
            .map(|(position, executor_id)| ExecutorRow {
                name: registry
                    .executor_name(&executor_id)
                    .unwrap_or(executor_id.as_str())
                    .to_string(),
                priority: registry
                    .configuration(&executor_id, extension, context)
                    .map_or(0, |config| config.priority),
                has_handler: registry.has_handler(&executor_id, extension, context),
                position,
                executor_id,
            })
            .collect();
        self.input = Some((extension.to_string(), context.to_string()));
        self.current = if self.rows.is_empty() { None } else { Some(0) };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn input(&self) -> Option<(&str, &str)> {
        self.input
            .as_ref()
            .map(|(ext, ctx)| (ext.as_str(), ctx.as_str()))
    }

    pub fn rows(&self) -> &[ExecutorRow] {
        &self.rows
    }

    pub fn current(&self) -> Option<&ExecutorRow> {
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

    pub fn position_of(&self, executor_id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.executor_id == executor_id)
    }
}
