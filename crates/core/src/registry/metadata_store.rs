//! Per-artifact identity, keyed by uuid in insertion order

use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::interfaces::RunConfigurationProvider;
use crate::types::RunConfigurationMetadata;

struct ArtifactEntry {
    metadata: RunConfigurationMetadata,
    provider: Weak<dyn RunConfigurationProvider>,
    provider_id: String,
}

/// Store of artifact metadata announced by providers
#[derive(Default)]
pub struct MetadataStore {
    entries: IndexMap<String, ArtifactEntry>,
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataStore")
            .field("artifacts", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new artifact owned by `provider`
    pub fn register(
        &mut self,
        provider: &Arc<dyn RunConfigurationProvider>,
        metadata: RunConfigurationMetadata,
    ) -> Result<()> {
        if self.entries.contains_key(&metadata.uuid) {
            return Err(Error::DuplicateArtifact(metadata.uuid));
        }

        tracing::debug!(
            "Registering run configuration {} ({}) from {}",
            metadata.uuid,
            metadata.name,
            provider.provider_id()
        );
        self.entries.insert(
            metadata.uuid.clone(),
            ArtifactEntry {
                metadata,
                provider: Arc::downgrade(provider),
                provider_id: provider.provider_id().to_string(),
            },
        );
        Ok(())
    }

    /// Replace the metadata of an artifact; only its owner may do so
    pub fn update(&mut self, provider_id: &str, metadata: RunConfigurationMetadata) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&metadata.uuid)
            .ok_or_else(|| Error::UnknownArtifact(metadata.uuid.clone()))?;
        if entry.provider_id != provider_id {
            return Err(Error::RegistryError(format!(
                "run configuration {} is owned by {}, not {}",
                metadata.uuid, entry.provider_id, provider_id
            )));
        }
        entry.metadata = metadata;
        Ok(())
    }

    /// Remove an artifact; absent uuids are ignored
    pub fn deregister(&mut self, uuid: &str) -> Option<RunConfigurationMetadata> {
        self.entries.shift_remove(uuid).map(|entry| entry.metadata)
    }

    pub fn get(&self, uuid: &str) -> Option<&RunConfigurationMetadata> {
        self.entries.get(uuid).map(|entry| &entry.metadata)
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.entries.contains_key(uuid)
    }

    /// The owning provider, if it is still alive
    pub fn provider_of(&self, uuid: &str) -> Option<Arc<dyn RunConfigurationProvider>> {
        self.entries.get(uuid).and_then(|entry| entry.provider.upgrade())
    }

    pub fn provider_id_of(&self, uuid: &str) -> Option<&str> {
        self.entries.get(uuid).map(|entry| entry.provider_id.as_str())
    }

    /// Metadata in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &RunConfigurationMetadata> {
        self.entries.values().map(|entry| &entry.metadata)
    }

    pub fn position(&self, uuid: &str) -> Option<usize> {
        self.entries.get_index_of(uuid)
    }

    pub fn get_index(&self, index: usize) -> Option<&RunConfigurationMetadata> {
        self.entries.get_index(index).map(|(_, entry)| &entry.metadata)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every artifact owned by `provider_id`, returning their uuids
    pub fn deregister_owner(&mut self, provider_id: &str) -> Vec<String> {
        self.remove_where(|entry| entry.provider_id == provider_id)
    }

    /// Remove artifacts whose provider has been dropped
    pub fn prune_dead(&mut self) -> Vec<String> {
        self.remove_where(|entry| entry.provider.strong_count() == 0)
    }

    fn remove_where(&mut self, predicate: impl Fn(&ArtifactEntry) -> bool) -> Vec<String> {
        let removed: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(uuid, _)| uuid.clone())
            .collect();
        for uuid in &removed {
            self.entries.shift_remove(uuid);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Context, RunConfiguration};

    struct NullProvider(&'static str);

    impl RunConfigurationProvider for NullProvider {
        fn provider_id(&self) -> &str {
            self.0
        }

        fn get_run_configuration(&self, uuid: &str) -> Result<RunConfiguration> {
            Err(Error::UnknownArtifact(uuid.to_string()))
        }

        fn get_run_configuration_per_context(
            &self,
            _context: &str,
            _action_name: Option<&str>,
            _re_run: bool,
        ) -> Result<Option<RunConfiguration>> {
            Ok(None)
        }
    }

    fn metadata(uuid: &str) -> RunConfigurationMetadata {
        RunConfigurationMetadata::new(
            uuid,
            format!("{}.py", uuid),
            "editor",
            format!("/work/{}.py", uuid),
            "py",
            Context::new("File"),
        )
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let provider: Arc<dyn RunConfigurationProvider> = Arc::new(NullProvider("editor"));
        let mut store = MetadataStore::new();
        store.register(&provider, metadata("A1")).unwrap();
        let err = store.register(&provider, metadata("A1")).unwrap_err();
        assert!(matches!(err, Error::DuplicateArtifact(uuid) if uuid == "A1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let provider: Arc<dyn RunConfigurationProvider> = Arc::new(NullProvider("editor"));
        let mut store = MetadataStore::new();
        for uuid in ["A3", "A1", "A2"] {
            store.register(&provider, metadata(uuid)).unwrap();
        }
        store.deregister("A1");
        store.deregister("missing");
        let order: Vec<_> = store.iter().map(|m| m.uuid.as_str()).collect();
        assert_eq!(order, vec!["A3", "A2"]);
    }

    #[test]
    fn test_dropped_provider_is_pruned() {
        let provider: Arc<dyn RunConfigurationProvider> = Arc::new(NullProvider("editor"));
        let other: Arc<dyn RunConfigurationProvider> = Arc::new(NullProvider("explorer"));
        let mut store = MetadataStore::new();
        store.register(&provider, metadata("A1")).unwrap();
        store.register(&other, metadata("B1")).unwrap();

        drop(provider);
        assert!(store.provider_of("A1").is_none());
        assert_eq!(store.prune_dead(), vec!["A1".to_string()]);
        assert!(store.contains("B1"));
    }

    #[test]
    fn test_only_owner_updates() {
        let provider: Arc<dyn RunConfigurationProvider> = Arc::new(NullProvider("editor"));
        let mut store = MetadataStore::new();
        store.register(&provider, metadata("A1")).unwrap();

        let mut renamed = metadata("A1");
        renamed.name = "renamed.py".into();
        assert!(store.update("explorer", renamed.clone()).is_err());
        store.update("editor", renamed).unwrap();
        assert_eq!(store.get("A1").unwrap().name, "renamed.py");
    }
}
