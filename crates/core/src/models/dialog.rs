//! Selection state of the Run dialog
//!
//! `Unselected -> Selected(extension, context, uuid)`. Selecting an
//! artifact resets the executors list to that artifact's pair; selecting
//! an executor resets the parameters list to the executor's triple.

use super::{ArtifactsModel, ExecutorsModel, ParametersModel};
use crate::dispatch::DispatchRequest;
use crate::error::{Error, Result};
use crate::run_core::RunCore;
use crate::types::ParameterKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Unselected,
    Selected {
        extension: String,
        context: String,
        uuid: String,
    },
}

#[derive(Debug, Clone)]
pub struct RunDialog {
    state: DialogState,
    artifacts: ArtifactsModel,
    executors: ExecutorsModel,
    parameters: ParametersModel,
}

impl RunDialog {
    pub fn new(core: &RunCore) -> Self {
        let mut dialog = Self {
            state: DialogState::Unselected,
            artifacts: ArtifactsModel::default(),
            executors: ExecutorsModel::default(),
            parameters: ParametersModel::default(),
        };
        dialog.sync(core);
        dialog
    }

    /// Follow the core's focused artifact
    pub fn sync(&mut self, core: &RunCore) {
        self.artifacts.refresh(core);
        match self.artifacts.selected().map(|row| row.uuid.clone()) {
            Some(uuid) => self.transition(core, &uuid),
            None => self.unselect(),
        }
    }

    /// Select an artifact row of the dialog
    pub fn select_artifact(&mut self, core: &RunCore, index: usize) -> Result<()> {
        if !self.artifacts.select(index) {
            return Err(Error::InvalidSelection(index));
        }
        let uuid = self
            .artifacts
            .selected()
            .map(|row| row.uuid.clone())
            .ok_or(Error::InvalidSelection(index))?;
        self.transition(core, &uuid);
        Ok(())
    }

    /// Select an executor row, resetting the parameters list
    pub fn select_executor(&mut self, core: &RunCore, index: usize) -> Result<()> {
        if !self.executors.set_current(index) {
            return Err(Error::InvalidSelection(index));
        }
        self.reset_parameters(core);
        Ok(())
    }

    pub fn select_parameters(&mut self, index: usize) -> Result<()> {
        if !self.parameters.set_current(index) {
            return Err(Error::InvalidSelection(index));
        }
        Ok(())
    }

    fn unselect(&mut self) {
        self.state = DialogState::Unselected;
        self.executors.clear();
        self.parameters.clear();
    }

    fn transition(&mut self, core: &RunCore, uuid: &str) {
        let Some(metadata) = core.metadata(uuid) else {
            self.unselect();
            return;
        };
        let (extension, context) = metadata.input_key();
        tracing::debug!("Run dialog selects {} ({}, {})", uuid, extension, context);

        self.executors.reset(core, &extension, &context);
        if let Ok(last) = core.resolve_last_used(uuid) {
            if let Some(position) = self.executors.position_of(&last.executor_id) {
                self.executors.set_current(position);
            }
        }
        self.state = DialogState::Selected {
            extension,
            context,
            uuid: uuid.to_string(),
        };
        self.reset_parameters(core);
    }

    fn reset_parameters(&mut self, core: &RunCore) {
        let DialogState::Selected {
            extension,
            context,
            uuid,
        } = &self.state
        else {
            self.parameters.clear();
            return;
        };
        let Some(executor) = self.executors.current() else {
            self.parameters.clear();
            return;
        };

        let key = ParameterKey::new(&executor.executor_id, extension, context);
        let preferred = core.get_last_used_params(uuid, &executor.executor_id).ok();
        self.parameters.reset(core, key, Some(uuid.as_str()));
        if let Some(preferred) = preferred {
            self.parameters.select_uuid(&preferred);
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn artifacts(&self) -> &ArtifactsModel {
        &self.artifacts
    }

    pub fn executors(&self) -> &ExecutorsModel {
        &self.executors
    }

    pub fn parameters(&self) -> &ParametersModel {
        &self.parameters
    }

    /// Run is enabled iff all three lists have a current row and the
    /// current executor has a handler for the pair
    pub fn run_enabled(&self) -> bool {
        matches!(self.state, DialogState::Selected { .. })
            && self.artifacts.selected().is_some()
            && self.parameters.current().is_some()
            && self.executors.current().is_some_and(|row| row.has_handler)
    }

    /// The dispatch request for the current rows, when Run is enabled
    pub fn request(&self) -> Option<DispatchRequest> {
        if !self.run_enabled() {
            return None;
        }
        let artifact = self.artifacts.selected()?;
        let executor = self.executors.current()?;
        let parameters = self.parameters.current()?;
        Some(DispatchRequest::new(
            &artifact.uuid,
            &executor.executor_id,
            &parameters.uuid,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{default_of, fixture};

    #[test]
    fn test_dialog_without_focus_is_unselected() {
        let fx = fixture();
        let dialog = RunDialog::new(&fx.core);
        assert_eq!(dialog.state(), &DialogState::Unselected);
        assert_eq!(dialog.artifacts().len(), 1);
        assert!(dialog.executors().rows().is_empty());
        assert!(!dialog.run_enabled());
        assert!(dialog.request().is_none());
    }

    #[test]
    fn test_dialog_follows_focus() {
        let mut fx = fixture();
        fx.core.switch_focus(Some("A1"));
        let dialog = RunDialog::new(&fx.core);

        assert_eq!(
            dialog.state(),
            &DialogState::Selected {
                extension: "py".into(),
                context: "file".into(),
                uuid: "A1".into(),
            }
        );
        let ids: Vec<&str> = dialog
            .executors()
            .rows()
            .iter()
            .map(|row| row.executor_id.as_str())
            .collect();
        assert_eq!(ids, ["X1", "X2"]);
        assert_eq!(dialog.executors().current().unwrap().executor_id, "X1");
        assert_eq!(dialog.parameters().rows().len(), 1);
        assert!(dialog.parameters().current().unwrap().read_only);
        assert!(dialog.run_enabled());
        assert_eq!(
            dialog.request(),
            Some(DispatchRequest::new(
                "A1",
                "X1",
                default_of(&fx.core, "X1", "file")
            ))
        );
    }

    #[test]
    fn test_selecting_executor_resets_parameters() {
        let mut fx = fixture();
        fx.core.switch_focus(Some("A1"));
        let mut dialog = RunDialog::new(&fx.core);

        dialog.select_executor(&fx.core, 1).unwrap();
        let key = dialog.parameters().key().unwrap();
        assert_eq!(key.executor_id, "X2");
        assert_eq!(
            dialog.request().unwrap().parameters_uuid,
            default_of(&fx.core, "X2", "file")
        );

        assert!(matches!(
            dialog.select_executor(&fx.core, 5),
            Err(Error::InvalidSelection(5))
        ));
        assert!(matches!(
            dialog.select_parameters(3),
            Err(Error::InvalidSelection(3))
        ));
        // a rejected selection keeps the current rows
        assert_eq!(dialog.executors().current_index(), Some(1));
    }

    #[test]
    fn test_dialog_preselects_last_used_pair() {
        let mut fx = fixture();
        let x2_default = default_of(&fx.core, "X2", "file");
        let custom = fx
            .core
            .derive_custom_parameters(&x2_default, "A1")
            .unwrap();
        fx.core
            .dispatch(DispatchRequest::new("A1", "X2", &custom.uuid))
            .unwrap();

        fx.core.switch_focus(Some("A1"));
        let dialog = RunDialog::new(&fx.core);
        assert_eq!(dialog.executors().current().unwrap().executor_id, "X2");
        let names: Vec<&str> = dialog
            .parameters()
            .rows()
            .iter()
            .map(|row| row.name.as_str())
            .collect();
        assert_eq!(names, ["Default", "Default (1)"]);
        assert_eq!(dialog.parameters().current().unwrap().uuid, custom.uuid);
    }

    #[test]
    fn test_sync_after_deregistration() {
        let mut fx = fixture();
        fx.core.switch_focus(Some("A1"));
        let mut dialog = RunDialog::new(&fx.core);
        assert!(dialog.run_enabled());

        fx.core.deregister_run_configuration_metadata("A1");
        dialog.sync(&fx.core);
        assert_eq!(dialog.state(), &DialogState::Unselected);
        assert!(dialog.artifacts().is_empty());
        assert!(dialog.parameters().rows().is_empty());
        assert!(!dialog.run_enabled());
    }

    #[test]
    fn test_selecting_artifact_row() {
        let fx = fixture();
        let mut dialog = RunDialog::new(&fx.core);
        dialog.select_artifact(&fx.core, 0).unwrap();
        assert!(matches!(dialog.state(), DialogState::Selected { uuid, .. } if uuid == "A1"));
        assert!(matches!(
            dialog.select_artifact(&fx.core, 1),
            Err(Error::InvalidSelection(1))
        ));
    }
}
