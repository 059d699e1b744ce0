//! The Run core: registries, parameters, focus and dispatch behind one owner
//!
//! The core is single-threaded. Every register, deregister and dispatch
//! call completes, including the rebuild of priority orderings, before it
//! returns. Observers are notified synchronously; focus changes they
//! request are queued and applied after the current round.

use indexmap::IndexMap;
use serde_json::Map;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::actions::{ActionStatus, ContextAction, ExecutorAction};
use crate::config::{ConfigStore, JsonFileStore, MemoryStore, RunSettings, SettingsEnv};
use crate::dispatch::{DispatchReport, DispatchRequest, resolve_working_dir};
use crate::error::{Error, Result};
use crate::events::{EventBus, RunEvent, SubscriptionId};
use crate::focus::{FocusRequests, FocusState};
use crate::interfaces::{RunConfigurationProvider, RunExecutor, RunResultViewer};
use crate::params::ParameterStore;
use crate::registry::{ExecutorRegistry, MetadataStore, ProviderRegistry, ViewerRegistry};
use crate::types::{
    ExecutorConfiguration, ExtendedRunParameters, IdentifierRegistry, LastUsed, OutputFormat,
    ParameterKey, ParameterSet, RunConfigurationMetadata, SupportedExtensionContexts,
};

/// Executor and parameters of the last run of a derived context
#[derive(Debug, Clone, PartialEq, Eq)]
struct ContextRun {
    executor_id: String,
    parameters_uuid: String,
    action: Option<String>,
}

pub struct RunCore {
    contexts: IdentifierRegistry,
    extensions: IdentifierRegistry,
    result_formats: IdentifierRegistry,
    metadata: MetadataStore,
    providers: ProviderRegistry,
    executors: ExecutorRegistry,
    viewers: ViewerRegistry,
    parameters: ParameterStore,
    focus: FocusState,
    focus_requests: FocusRequests,
    events: EventBus,
    settings: RunSettings,
    working_dir: PathBuf,
    last_executed_primary: Option<String>,
    context_runs: IndexMap<(String, String), ContextRun>,
}

impl fmt::Debug for RunCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunCore")
            .field("metadata", &self.metadata)
            .field("providers", &self.providers)
            .field("executors", &self.executors)
            .field("viewers", &self.viewers)
            .field("parameters", &self.parameters)
            .field("focused", &self.focus.focused())
            .finish()
    }
}

impl RunCore {
    /// Initialise the core, loading persisted parameters from `backend`
    pub fn init(settings: RunSettings, backend: Box<dyn ConfigStore>) -> Self {
        let working_dir = settings.working_dir();
        tracing::info!("Initialising run core (working dir {:?})", working_dir);
        Self {
            contexts: IdentifierRegistry::contexts(),
            extensions: IdentifierRegistry::extensions(),
            result_formats: IdentifierRegistry::result_formats(),
            metadata: MetadataStore::new(),
            providers: ProviderRegistry::new(),
            executors: ExecutorRegistry::new(),
            viewers: ViewerRegistry::new(),
            parameters: ParameterStore::load(backend),
            focus: FocusState::default(),
            focus_requests: FocusRequests::new(),
            events: EventBus::new(),
            settings,
            working_dir,
            last_executed_primary: None,
            context_runs: IndexMap::new(),
        }
    }

    /// A core whose state is not persisted
    pub fn in_memory() -> Self {
        Self::init(RunSettings::default(), Box::new(MemoryStore::new()))
    }

    /// A core persisted to the JSON store located from `settings` and `env`
    pub fn open(settings: RunSettings, env: &SettingsEnv) -> Result<Self> {
        let path = settings.resolved_store_path(env);
        let store = JsonFileStore::open(path)?;
        Ok(Self::init(settings, Box::new(store)))
    }

    /// Flush persisted state and tear the core down
    pub fn shutdown(mut self) -> Result<()> {
        tracing::info!("Shutting down run core");
        self.focus.set(None);
        self.parameters.flush()
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Directory used by the `cwd` working directory policy
    pub fn current_working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn set_current_working_dir(&mut self, path: impl Into<PathBuf>) {
        self.working_dir = path.into();
        tracing::debug!("Working directory set to {:?}", self.working_dir);
    }

    // Identifier registries

    pub fn contexts(&self) -> &IdentifierRegistry {
        &self.contexts
    }

    pub fn extensions(&self) -> &IdentifierRegistry {
        &self.extensions
    }

    pub fn result_formats(&self) -> &IdentifierRegistry {
        &self.result_formats
    }

    /// Identifier of a context given either its identifier or display name
    pub fn context_id(&self, context: &str) -> String {
        self.contexts
            .lookup(context)
            .map(str::to_string)
            .unwrap_or_else(|| context.to_string())
    }

    // Providers and artifacts

    pub fn register_provider_configuration(
        &mut self,
        provider: &Arc<dyn RunConfigurationProvider>,
        configurations: &[SupportedExtensionContexts],
    ) -> Result<()> {
        for config in configurations {
            self.extensions.add_tag(&config.input_extension)?;
            for ext_ctx in &config.contexts {
                self.contexts.add_named(&ext_ctx.context)?;
            }
        }
        self.providers.register(provider, configurations)
    }

    pub fn deregister_provider_configuration(
        &mut self,
        provider_id: &str,
        configurations: &[SupportedExtensionContexts],
    ) {
        tracing::debug!("Deregistering configurations of provider {}", provider_id);
        self.providers.deregister(provider_id, configurations);
    }

    pub fn providers_for(
        &self,
        extension: &str,
        context: &str,
    ) -> Vec<Arc<dyn RunConfigurationProvider>> {
        self.providers.providers_for(extension, &self.context_id(context))
    }

    pub fn provider_registry(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn register_run_configuration_metadata(
        &mut self,
        provider: &Arc<dyn RunConfigurationProvider>,
        metadata: RunConfigurationMetadata,
    ) -> Result<()> {
        self.contexts.add_named(&metadata.context)?;
        self.extensions.add_tag(&metadata.input_extension)?;
        let uuid = metadata.uuid.clone();
        self.metadata.register(provider, metadata)?;
        self.events.emit(&RunEvent::ArtifactRegistered { uuid });
        self.process_focus_requests();
        Ok(())
    }

    /// Replace an artifact's metadata; only its provider may do so
    pub fn update_run_configuration_metadata(
        &mut self,
        provider_id: &str,
        metadata: RunConfigurationMetadata,
    ) -> Result<()> {
        self.contexts.add_named(&metadata.context)?;
        self.extensions.add_tag(&metadata.input_extension)?;
        self.metadata.update(provider_id, metadata)
    }

    /// Remove an artifact; absent uuids are ignored
    pub fn deregister_run_configuration_metadata(&mut self, uuid: &str) {
        if self.metadata.deregister(uuid).is_none() {
            return;
        }
        self.forget_artifact(uuid);
    }

    fn forget_artifact(&mut self, uuid: &str) {
        tracing::debug!("Run configuration {} deregistered", uuid);
        if self.last_executed_primary.as_deref() == Some(uuid) {
            self.last_executed_primary = None;
        }
        self.context_runs.retain(|(artifact, _), _| artifact != uuid);
        self.events.emit(&RunEvent::ArtifactDeregistered {
            uuid: uuid.to_string(),
        });
        if self.focus.focused() == Some(uuid) {
            self.apply_focus(None, None);
        }
        self.process_focus_requests();
    }

    pub fn metadata(&self, uuid: &str) -> Option<&RunConfigurationMetadata> {
        self.metadata.get(uuid)
    }

    /// Artifacts in registration order
    pub fn artifacts(&self) -> impl Iterator<Item = &RunConfigurationMetadata> {
        self.metadata.iter()
    }

    pub fn metadata_store(&self) -> &MetadataStore {
        &self.metadata
    }

    // Executors

    /// Register `executor` for each configuration, creating the Default
    /// parameter set of every new triple from the widget's defaults
    pub fn register_executor_configuration(
        &mut self,
        executor: &Arc<dyn RunExecutor>,
        configurations: &[ExecutorConfiguration],
    ) -> Result<()> {
        for config in configurations {
            self.extensions.add_tag(&config.input_extension)?;
            self.contexts.add_named(&config.context)?;
            for format in &config.output_formats {
                self.result_formats.add_named(format)?;
            }
        }

        let executor_id = executor.executor_id().to_string();
        // every triple has its Default set before the executor becomes visible
        for config in configurations {
            let (extension, context) = config.input_key();
            let defaults = config
                .configuration_widget
                .as_ref()
                .map(|factory| factory.get_default_configuration())
                .unwrap_or_else(Map::new);
            let key = ParameterKey::new(&executor_id, &extension, &context);
            self.parameters.ensure_default(&key, defaults)?;
        }

        self.executors.register(executor, configurations);
        tracing::info!(
            "Executor {} registered {} configurations",
            executor_id,
            configurations.len()
        );
        for config in configurations {
            let (extension, context) = config.input_key();
            self.events
                .emit(&RunEvent::ExecutorsChanged { extension, context });
        }
        self.process_focus_requests();
        Ok(())
    }

    /// Remove `executor_id` from each configured pair; Default sets stay stored
    pub fn deregister_executor_configuration(
        &mut self,
        executor_id: &str,
        configurations: &[ExecutorConfiguration],
    ) {
        self.executors.deregister(executor_id, configurations);
        for config in configurations {
            let (extension, context) = config.input_key();
            self.events
                .emit(&RunEvent::ExecutorsChanged { extension, context });
        }
        self.process_focus_requests();
    }

    /// Live executors for a pair, best first
    pub fn executors_for(&self, extension: &str, context: &str) -> Vec<String> {
        self.executors.executors_for(extension, &self.context_id(context))
    }

    pub fn default_executor_for(&self, extension: &str, context: &str) -> Option<String> {
        self.executors
            .default_executor_for(extension, &self.context_id(context))
    }

    pub fn supports(&self, executor_id: &str, extension: &str, context: &str) -> bool {
        self.executors
            .supports(executor_id, extension, &self.context_id(context))
    }

    pub fn executor_registry(&self) -> &ExecutorRegistry {
        &self.executors
    }

    // Viewers

    pub fn register_viewer(
        &mut self,
        viewer: &Arc<dyn RunResultViewer>,
        formats: &[OutputFormat],
    ) -> Result<()> {
        let ids = formats
            .iter()
            .map(|format| self.result_formats.add_named(format))
            .collect::<Result<Vec<_>>>()?;
        self.viewers.register(viewer, &ids);
        Ok(())
    }

    pub fn deregister_viewer(&mut self, viewer_id: &str, formats: &[OutputFormat]) {
        let ids: Vec<String> = formats.iter().map(OutputFormat::id).collect();
        self.viewers.deregister(viewer_id, &ids);
    }

    pub fn viewers_for(&self, format: &str) -> Vec<Arc<dyn RunResultViewer>> {
        self.viewers.viewers_for(format)
    }

    // Teardown

    /// Remove everything registered under `owner_id`, whether it is a
    /// provider, an executor or a viewer
    pub fn deregister_all(&mut self, owner_id: &str) {
        tracing::debug!("Deregistering everything owned by {}", owner_id);
        for uuid in self.metadata.deregister_owner(owner_id) {
            self.forget_artifact(&uuid);
        }
        self.providers.deregister_owner(owner_id);
        for (extension, context) in self.executors.deregister_owner(owner_id) {
            self.events
                .emit(&RunEvent::ExecutorsChanged { extension, context });
        }
        self.viewers.deregister_owner(owner_id);
        self.process_focus_requests();
    }

    /// Drop every registration whose provider, executor or viewer is gone
    pub fn sweep(&mut self) {
        for uuid in self.metadata.prune_dead() {
            self.forget_artifact(&uuid);
        }
        self.providers.prune_dead();
        for (executor_id, keys) in self.executors.prune_dead() {
            tracing::debug!("Executor {} was dropped", executor_id);
            for (extension, context) in keys {
                self.events
                    .emit(&RunEvent::ExecutorsChanged { extension, context });
            }
        }
        self.viewers.prune_dead();
        self.process_focus_requests();
    }

    // Parameters

    pub fn list_parameters(
        &self,
        executor_id: &str,
        extension: &str,
        context: &str,
        artifact_uuid: Option<&str>,
    ) -> Vec<ParameterSet> {
        let key = ParameterKey::new(executor_id, extension, self.context_id(context));
        self.parameters.list_parameters(&key, artifact_uuid)
    }

    pub fn get_parameters(&self, uuid: &str) -> Result<&ParameterSet> {
        self.parameters
            .get_parameters(uuid)
            .ok_or_else(|| Error::UnknownParameters(uuid.to_string()))
    }

    pub fn default_parameters(&self, key: &ParameterKey) -> Option<&ParameterSet> {
        self.parameters.default_for(key)
    }

    /// Every stored record, in insertion order
    pub fn all_parameters(&self) -> impl Iterator<Item = &ParameterSet> {
        self.parameters.iter()
    }

    pub fn upsert_parameters(&mut self, record: ParameterSet) -> Result<()> {
        let key = record.key();
        let uuid = record.uuid.clone();
        self.parameters.upsert_parameters(record)?;
        self.events.emit(&RunEvent::ParametersChanged { key, uuid });
        self.process_focus_requests();
        Ok(())
    }

    pub fn delete_parameters(&mut self, uuid: &str) -> Result<ParameterSet> {
        let record = self.parameters.delete_parameters(uuid)?;
        self.events.emit(&RunEvent::ParametersChanged {
            key: record.key(),
            uuid: record.uuid.clone(),
        });
        self.process_focus_requests();
        Ok(record)
    }

    /// Copy a global preset into a custom preset of `artifact_uuid`
    pub fn derive_custom_parameters(
        &mut self,
        source_uuid: &str,
        artifact_uuid: &str,
    ) -> Result<ParameterSet> {
        if !self.metadata.contains(artifact_uuid) {
            return Err(Error::UnknownArtifact(artifact_uuid.to_string()));
        }
        let custom = self.parameters.derive_custom(source_uuid, artifact_uuid)?;
        self.events.emit(&RunEvent::ParametersChanged {
            key: custom.key(),
            uuid: custom.uuid.clone(),
        });
        self.process_focus_requests();
        Ok(custom)
    }

    pub fn set_last_used(
        &mut self,
        artifact_uuid: &str,
        executor_id: &str,
        parameters_uuid: &str,
    ) -> Result<()> {
        self.parameters
            .set_last_used(artifact_uuid, executor_id, parameters_uuid)
    }

    /// Last dispatched pair of an artifact, falling back to the default
    /// executor and its Default set. Pointers of unknown artifacts are pruned.
    pub fn get_last_used(&mut self, artifact_uuid: &str) -> Result<LastUsed> {
        if !self.metadata.contains(artifact_uuid) {
            self.parameters.remove_last_used(artifact_uuid)?;
            return Err(Error::UnknownArtifact(artifact_uuid.to_string()));
        }
        self.resolve_last_used(artifact_uuid)
    }

    /// Read-only variant of [`Self::get_last_used`]
    pub fn resolve_last_used(&self, artifact_uuid: &str) -> Result<LastUsed> {
        let metadata = self
            .metadata
            .get(artifact_uuid)
            .ok_or_else(|| Error::UnknownArtifact(artifact_uuid.to_string()))?;
        let (extension, context) = metadata.input_key();

        if let Some(pointer) = self.parameters.last_used(artifact_uuid) {
            if self.executors.supports(&pointer.executor_id, &extension, &context) {
                let key = ParameterKey::new(&pointer.executor_id, &extension, &context);
                let valid = self
                    .parameters
                    .get_parameters(&pointer.parameter_uuid)
                    .is_some_and(|p| p.applies_to(&key, artifact_uuid));
                if valid {
                    return Ok(pointer);
                }
                let default = self.default_parameters_uuid(&key)?;
                return Ok(LastUsed::new(pointer.executor_id, default));
            }
        }

        let executor_id = self
            .executors
            .default_executor_for(&extension, &context)
            .ok_or_else(|| Error::unsupported("*", &extension, &context))?;
        let key = ParameterKey::new(&executor_id, &extension, &context);
        let default = self.default_parameters_uuid(&key)?;
        Ok(LastUsed::new(executor_id, default))
    }

    /// Parameters last used with `executor_id` for an artifact, or the
    /// executor's Default set for the artifact's own context
    pub fn get_last_used_params(&self, artifact_uuid: &str, executor_id: &str) -> Result<String> {
        let metadata = self
            .metadata
            .get(artifact_uuid)
            .ok_or_else(|| Error::UnknownArtifact(artifact_uuid.to_string()))?;
        let (extension, context) = metadata.input_key();
        let key = ParameterKey::new(executor_id, &extension, &context);

        let remembered = self
            .parameters
            .last_used_params(artifact_uuid, executor_id)
            .and_then(|uuid| self.parameters.get_parameters(uuid))
            .filter(|p| p.applies_to(&key, artifact_uuid));
        match remembered {
            Some(params) => Ok(params.uuid.clone()),
            None => self.default_parameters_uuid(&key),
        }
    }

    fn default_parameters_uuid(&self, key: &ParameterKey) -> Result<String> {
        self.parameters
            .default_for(key)
            .map(|p| p.uuid.clone())
            .ok_or_else(|| {
                Error::mismatch(&key.to_string(), "no default parameter set is registered")
            })
    }

    // Focus

    pub fn focused(&self) -> Option<&str> {
        self.focus.focused()
    }

    /// Handle through which observers queue focus changes
    pub fn focus_requests(&self) -> FocusRequests {
        self.focus_requests.clone()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&RunEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Focus an artifact on behalf of an external caller.
    ///
    /// Unknown uuids clear the focus. The owning provider is called back.
    pub fn switch_focus(&mut self, uuid: Option<&str>) {
        self.apply_focus(uuid.map(str::to_string), None);
        self.process_focus_requests();
    }

    /// Focus an artifact on behalf of the provider that owns it, which is
    /// not called back
    pub fn switch_focus_from(&mut self, provider_id: &str, uuid: Option<&str>) {
        self.apply_focus(uuid.map(str::to_string), Some(provider_id));
        self.process_focus_requests();
    }

    fn apply_focus(&mut self, uuid: Option<String>, origin: Option<&str>) {
        let uuid = uuid.filter(|u| {
            let known = self.metadata.contains(u);
            if !known {
                tracing::debug!("Ignoring focus on unknown run configuration {}", u);
            }
            known
        });
        if !self.focus.set(uuid.clone()) {
            return;
        }

        tracing::debug!("Focus changed to {:?}", uuid);
        self.events.emit(&RunEvent::FocusChanged { uuid: uuid.clone() });

        if let Some(uuid) = &uuid {
            let owner = self.metadata.provider_id_of(uuid);
            if owner.is_some() && owner != origin {
                if let Some(provider) = self.metadata.provider_of(uuid) {
                    provider.focus_run_configuration(uuid);
                }
            }
        }
    }

    fn process_focus_requests(&mut self) {
        while let Some(request) = self.focus_requests.pop() {
            self.apply_focus(request, None);
        }
    }

    // Dispatch

    /// Build the run input, resolve the handler and invoke it.
    ///
    /// Failures leave last-used untouched. Dispatches of the artifact's
    /// primary context update last-used; derived contexts are remembered
    /// for re-running.
    pub fn dispatch(&mut self, request: DispatchRequest) -> Result<DispatchReport> {
        let uuid = request.artifact_uuid.as_str();
        let executor_id = request.executor_id.as_str();
        let metadata = self
            .metadata
            .get(uuid)
            .cloned()
            .ok_or_else(|| Error::UnknownArtifact(uuid.to_string()))?;
        let extension = metadata.input_extension.clone();
        let context = match &request.context {
            Some(context) => self.context_id(context),
            None => metadata.context_id(),
        };

        if !self.executors.supports(executor_id, &extension, &context) {
            return Err(Error::unsupported(executor_id, &extension, &context));
        }

        let key = ParameterKey::new(executor_id, &extension, &context);
        let params = self
            .parameters
            .get_parameters(&request.parameters_uuid)
            .cloned()
            .ok_or_else(|| Error::mismatch(&request.parameters_uuid, "unknown parameter set"))?;
        if params.key() != key {
            return Err(Error::mismatch(
                &params.uuid,
                format!("parameters belong to {}, not {}", params.key(), key),
            ));
        }
        if !params.applies_to(&key, uuid) {
            return Err(Error::mismatch(
                &params.uuid,
                format!("custom parameters are bound to another artifact, not {uuid}"),
            ));
        }

        let provider_id = self
            .metadata
            .provider_id_of(uuid)
            .map(str::to_string)
            .unwrap_or_default();
        let provider = self
            .metadata
            .provider_of(uuid)
            .filter(|_| self.providers.supports(&provider_id, &extension, &context))
            .ok_or_else(|| Error::UnknownProvider(uuid.to_string()))?;
        let is_primary = self.providers.is_primary(&provider_id, &extension, &context);

        let input = if is_primary {
            provider.get_run_configuration(uuid)?
        } else {
            provider
                .get_run_configuration_per_context(
                    &context,
                    request.action.as_deref(),
                    request.re_run,
                )?
                .ok_or_else(|| Error::RunInputDiscarded(context.clone()))?
        };

        let requires_cwd = self
            .executors
            .configuration(executor_id, &extension, &context)
            .is_some_and(|config| config.requires_cwd);
        let working_dir = resolve_working_dir(&params.working_dir, &metadata.path, &self.working_dir);
        if requires_cwd && working_dir.is_none() {
            return Err(Error::MissingWorkingDirectory(executor_id.to_string()));
        }

        let handler = self
            .executors
            .resolve_handler(executor_id, &extension, &context)?;
        let extended = ExtendedRunParameters {
            executor_params: params.executor_params.clone(),
            params,
            working_dir: working_dir.clone(),
        };

        tracing::info!(
            "Dispatching {} ({}, {}) to {} with parameters {}",
            uuid,
            extension,
            context,
            executor_id,
            request.parameters_uuid
        );
        let results = handler.execute(&input, &extended).map_err(|e| {
            tracing::debug!("Executor {} failed: {}", executor_id, e);
            Error::ExecutionFailed {
                executor: executor_id.to_string(),
                message: e.message,
            }
        })?;

        if is_primary {
            if let Err(e) = self
                .parameters
                .set_last_used(uuid, executor_id, &request.parameters_uuid)
            {
                tracing::warn!("Could not persist last used parameters of {}: {}", uuid, e);
            }
            self.last_executed_primary = Some(uuid.to_string());
        } else {
            self.context_runs.insert(
                (uuid.to_string(), context.clone()),
                ContextRun {
                    executor_id: executor_id.to_string(),
                    parameters_uuid: request.parameters_uuid.clone(),
                    action: request.action.clone(),
                },
            );
        }

        let mut viewers = IndexMap::new();
        for result in &results {
            if !result.is_displayable() {
                continue;
            }
            if let Some(format) = result.output_format() {
                if !viewers.contains_key(format) {
                    viewers.insert(format.to_string(), self.viewers.viewers_for(format));
                }
            }
        }

        self.events.emit(&RunEvent::Dispatched {
            uuid: uuid.to_string(),
            executor_id: executor_id.to_string(),
            parameters_uuid: request.parameters_uuid.clone(),
            context: context.clone(),
        });
        self.process_focus_requests();

        Ok(DispatchReport {
            artifact_uuid: request.artifact_uuid.clone(),
            executor_id: request.executor_id.clone(),
            parameters_uuid: request.parameters_uuid.clone(),
            context,
            working_dir,
            results,
            viewers,
        })
    }

    // Quick-run actions

    fn focused_uuid(&self) -> Result<String> {
        self.focus
            .focused()
            .map(str::to_string)
            .ok_or(Error::NoFocusedArtifact)
    }

    /// Run the focused artifact with its last-used pair
    pub fn run_focused(&mut self) -> Result<DispatchReport> {
        let uuid = self.focused_uuid()?;
        let last = self.get_last_used(&uuid)?;
        self.dispatch(DispatchRequest::new(uuid, last.executor_id, last.parameter_uuid))
    }

    /// Run the last executed primary artifact again with its last-used pair
    pub fn re_run_last(&mut self) -> Result<DispatchReport> {
        let uuid = self.last_executed_primary.clone().ok_or(Error::NothingToReRun)?;
        let last = self.get_last_used(&uuid)?;
        self.dispatch(DispatchRequest::new(uuid, last.executor_id, last.parameter_uuid).re_run(true))
    }

    /// Run a context of the focused artifact with the preferred executor:
    /// the settings default for the extension, then the last-used executor,
    /// then the registry default
    pub fn run_context(&mut self, context: &str, action: Option<&str>) -> Result<DispatchReport> {
        let uuid = self.focused_uuid()?;
        let context = self.context_id(context);
        let (extension, own_context) = self
            .metadata
            .get(&uuid)
            .map(RunConfigurationMetadata::input_key)
            .ok_or_else(|| Error::UnknownArtifact(uuid.clone()))?;

        let from_settings = self
            .settings
            .default_executor_for(&extension)
            .map(str::to_string);
        let from_last_used = self
            .parameters
            .last_used(&uuid)
            .map(|pointer| pointer.executor_id);
        let executor_id = from_settings
            .into_iter()
            .chain(from_last_used)
            .find(|id| self.executors.supports(id, &extension, &context))
            .or_else(|| self.executors.default_executor_for(&extension, &context))
            .ok_or_else(|| Error::unsupported("*", &extension, &context))?;

        self.run_with_executor(uuid, executor_id, extension, own_context, context, action)
    }

    /// Run the same context again with the executor and parameters of its
    /// previous run, asking the provider for the same input
    pub fn re_run_context(&mut self, context: &str, action: Option<&str>) -> Result<DispatchReport> {
        let uuid = self.focused_uuid()?;
        let context = self.context_id(context);
        let previous = self
            .context_runs
            .get(&(uuid.clone(), context.clone()))
            .cloned()
            .ok_or(Error::NothingToReRun)?;

        let mut request =
            DispatchRequest::new(uuid, previous.executor_id, previous.parameters_uuid)
                .with_context(context)
                .re_run(true);
        request.action = action.map(str::to_string).or(previous.action);
        self.dispatch(request)
    }

    /// Run the focused artifact with a given executor, for its own context
    /// unless `context` is given
    pub fn run_in_executor(
        &mut self,
        executor_id: &str,
        context: Option<&str>,
    ) -> Result<DispatchReport> {
        let uuid = self.focused_uuid()?;
        let (extension, own_context) = self
            .metadata
            .get(&uuid)
            .map(RunConfigurationMetadata::input_key)
            .ok_or_else(|| Error::UnknownArtifact(uuid.clone()))?;
        let context = context
            .map(|c| self.context_id(c))
            .unwrap_or_else(|| own_context.clone());
        if !self.executors.supports(executor_id, &extension, &context) {
            return Err(Error::unsupported(executor_id, &extension, &context));
        }
        self.run_with_executor(
            uuid,
            executor_id.to_string(),
            extension,
            own_context,
            context,
            None,
        )
    }

    fn run_with_executor(
        &mut self,
        uuid: String,
        executor_id: String,
        extension: String,
        own_context: String,
        context: String,
        action: Option<&str>,
    ) -> Result<DispatchReport> {
        let parameters_uuid = if context == own_context {
            self.get_last_used_params(&uuid, &executor_id)?
        } else {
            self.default_parameters_uuid(&ParameterKey::new(&executor_id, &extension, &context))?
        };
        let mut request = DispatchRequest::new(uuid, executor_id, parameters_uuid).with_context(context);
        request.action = action.map(str::to_string);
        self.dispatch(request)
    }

    /// Which host actions are enabled for the focused artifact
    pub fn action_status(&self) -> ActionStatus {
        let re_run_last = self
            .last_executed_primary
            .as_deref()
            .is_some_and(|uuid| self.metadata.contains(uuid));
        let mut status = ActionStatus {
            re_run_last,
            ..Default::default()
        };

        let Some(uuid) = self.focus.focused() else {
            return status;
        };
        let Some(metadata) = self.metadata.get(uuid) else {
            return status;
        };
        let (extension, own_context) = metadata.input_key();
        let provider_id = self.metadata.provider_id_of(uuid).unwrap_or_default();

        status.focused = Some(uuid.to_string());
        status.configure = true;
        status.run = !self.executors.executors_for(&extension, &own_context).is_empty();

        for declared in self.providers.contexts_of(provider_id, &extension) {
            let executors = self.executors.executors_for(&extension, &declared.context);
            let provided = self.providers.supports(provider_id, &extension, &declared.context);
            let re_run_enabled = self
                .context_runs
                .contains_key(&(uuid.to_string(), declared.context.clone()));

            for executor_id in self.executors.executor_ids() {
                status.executors.push(ExecutorAction {
                    enabled: provided && executors.contains(&executor_id),
                    executor_id,
                    context: declared.context.clone(),
                });
            }
            status.contexts.push(ContextAction {
                enabled: provided && !executors.is_empty(),
                context: declared.context,
                is_primary: declared.is_primary,
                is_shown: declared.is_shown,
                re_run_enabled,
            });
        }
        status
    }
}
