//! Interface implemented by producers of runnable artifacts

use crate::error::Result;
use crate::types::RunConfiguration;

/// An editor, explorer or any other component that owns artifacts and
/// assembles their run input on demand.
pub trait RunConfigurationProvider: Send + Sync {
    /// Stable identifier, used for ownership bookkeeping
    fn provider_id(&self) -> &str;

    /// Run input and metadata of a primary artifact
    fn get_run_configuration(&self, uuid: &str) -> Result<RunConfiguration>;

    /// Run input for a derived context (selection, cell, ...).
    ///
    /// `action_name` lets the provider tell apart actions that share a
    /// context; `re_run` asks for the same input as the previous call.
    /// Returning `None` discards the run.
    fn get_run_configuration_per_context(
        &self,
        context: &str,
        action_name: Option<&str>,
        re_run: bool,
    ) -> Result<Option<RunConfiguration>>;

    /// Called when focus was moved to one of this provider's artifacts
    /// from elsewhere
    fn focus_run_configuration(&self, _uuid: &str) {}
}
