//! Persisted parameter sets and last-used pointers
//!
//! Records live in memory, keyed by uuid in insertion order, and are
//! mirrored to the `run` section of a [`ConfigStore`]:
//!
//! - `parameters/<executor>/<extension>/<context>/<uuid>` holds a record
//! - `last_used/<artifact>` holds the last dispatched pair
//!
//! Every mutation updates memory first, then writes and flushes the store.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::config::{ConfigStore, RUN_SECTION};
use crate::error::{Error, Result};
use crate::types::{LastUsed, ParameterKey, ParameterSet};

const PARAMETERS_PREFIX: &str = "parameters/";
const LAST_USED_PREFIX: &str = "last_used/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredLastUsed {
    executor_id: String,
    parameter_uuid: String,
    /// Last parameter set per executor, used when switching executors
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    per_executor: BTreeMap<String, String>,
}

pub struct ParameterStore {
    records: IndexMap<String, ParameterSet>,
    defaults: HashMap<ParameterKey, String>,
    last_used: IndexMap<String, StoredLastUsed>,
    backend: Box<dyn ConfigStore>,
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("records", &self.records.len())
            .field("last_used", &self.last_used.len())
            .finish()
    }
}

fn parameter_key(record: &ParameterSet) -> String {
    format!(
        "{PARAMETERS_PREFIX}{}/{}/{}/{}",
        record.executor_id, record.extension, record.context, record.uuid
    )
}

fn last_used_key(artifact_uuid: &str) -> String {
    format!("{LAST_USED_PREFIX}{artifact_uuid}")
}

impl ParameterStore {
    /// Load every record and pointer held by `backend`.
    ///
    /// Unreadable entries are skipped with a warning.
    pub fn load(backend: Box<dyn ConfigStore>) -> Self {
        let mut store = Self {
            records: IndexMap::new(),
            defaults: HashMap::new(),
            last_used: IndexMap::new(),
            backend,
        };

        for key in store.backend.keys_with_prefix(RUN_SECTION, PARAMETERS_PREFIX) {
            let Some(value) = store.backend.get(RUN_SECTION, &key) else {
                continue;
            };
            let record: ParameterSet = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Skipping unreadable parameters at '{}': {}", key, e);
                    continue;
                }
            };
            if record.is_default {
                let triple = record.key();
                if let Some(existing) = store.defaults.get(&triple) {
                    tracing::warn!(
                        "Ignoring second default {} for {}, keeping {}",
                        record.uuid,
                        triple,
                        existing
                    );
                    continue;
                }
                store.defaults.insert(triple, record.uuid.clone());
            }
            store.records.insert(record.uuid.clone(), record);
        }

        for key in store.backend.keys_with_prefix(RUN_SECTION, LAST_USED_PREFIX) {
            let Some(value) = store.backend.get(RUN_SECTION, &key) else {
                continue;
            };
            match serde_json::from_value::<StoredLastUsed>(value) {
                Ok(pointer) => {
                    let artifact = key.trim_start_matches(LAST_USED_PREFIX).to_string();
                    store.last_used.insert(artifact, pointer);
                }
                Err(e) => tracing::warn!("Skipping unreadable last-used at '{}': {}", key, e),
            }
        }

        tracing::debug!(
            "Loaded {} parameter sets and {} last-used pointers",
            store.records.len(),
            store.last_used.len()
        );
        store
    }

    /// Create the Default set of `key` unless one exists; returns its uuid
    pub fn ensure_default(&mut self, key: &ParameterKey, defaults: Map<String, Value>) -> Result<String> {
        if let Some(uuid) = self.defaults.get(key) {
            return Ok(uuid.clone());
        }

        let record = ParameterSet::default_for(key, defaults);
        let uuid = record.uuid.clone();
        tracing::debug!("Creating default parameters {} for {}", uuid, key);
        self.upsert_parameters(record)?;
        Ok(uuid)
    }

    pub fn default_for(&self, key: &ParameterKey) -> Option<&ParameterSet> {
        self.defaults.get(key).and_then(|uuid| self.records.get(uuid))
    }

    /// Default first, then global presets, then custom presets of `artifact_uuid`
    pub fn list_parameters(&self, key: &ParameterKey, artifact_uuid: Option<&str>) -> Vec<ParameterSet> {
        let in_triple = |record: &&ParameterSet| record.key() == *key;

        let mut listed: Vec<ParameterSet> = self.default_for(key).into_iter().cloned().collect();
        listed.extend(
            self.records
                .values()
                .filter(in_triple)
                .filter(|r| r.is_global && !r.is_default)
                .cloned(),
        );
        listed.extend(
            self.records
                .values()
                .filter(in_triple)
                .filter(|r| r.is_custom() && r.visible_for(artifact_uuid))
                .cloned(),
        );
        listed
    }

    pub fn get_parameters(&self, uuid: &str) -> Option<&ParameterSet> {
        self.records.get(uuid)
    }

    /// Every record in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ParameterSet> {
        self.records.values()
    }

    /// Insert or replace a record
    pub fn upsert_parameters(&mut self, record: ParameterSet) -> Result<()> {
        self.validate(&record)?;

        if record.is_default {
            self.defaults.insert(record.key(), record.uuid.clone());
        }

        let value = serde_json::to_value(&record)?;
        self.backend.set(RUN_SECTION, &parameter_key(&record), value);
        tracing::debug!("Stored parameters {} ({}) for {}", record.uuid, record.name, record.key());
        self.records.insert(record.uuid.clone(), record);
        self.commit()
    }

    fn validate(&self, record: &ParameterSet) -> Result<()> {
        let mismatch = |reason: &str| Error::mismatch(&record.uuid, reason);

        if let Some(existing) = self.records.get(&record.uuid) {
            if existing.is_default != record.is_default {
                return Err(mismatch("the default flag of a parameter set cannot change"));
            }
            if existing.key() != record.key() {
                return Err(mismatch("the triple of a stored parameter set cannot change"));
            }
        }
        if record.is_default {
            if let Some(uuid) = self.defaults.get(&record.key()) {
                if *uuid != record.uuid {
                    return Err(mismatch("the triple already has a default parameter set"));
                }
            }
        }
        if (record.is_default || record.is_global) && record.artifact_uuid.is_some() {
            return Err(mismatch("global parameter sets cannot be bound to an artifact"));
        }
        if record.is_custom() && record.artifact_uuid.is_none() {
            return Err(mismatch("custom parameter sets must be bound to an artifact"));
        }

        let clash = self.records.values().any(|other| {
            other.uuid != record.uuid
                && other.key() == record.key()
                && other.name == record.name
                && (!record.is_custom()
                    || !other.is_custom()
                    || other.artifact_uuid == record.artifact_uuid)
        });
        if clash {
            let scope = match &record.artifact_uuid {
                Some(artifact) if record.is_custom() => format!("{} on {}", record.key(), artifact),
                _ => record.key().to_string(),
            };
            return Err(Error::DuplicateParameterName {
                name: record.name.clone(),
                scope,
            });
        }
        Ok(())
    }

    /// Delete a record.
    ///
    /// Default sets are protected. Global presets cannot be deleted while a
    /// last-used pointer references them or a custom preset derived from them.
    pub fn delete_parameters(&mut self, uuid: &str) -> Result<ParameterSet> {
        let record = self
            .records
            .get(uuid)
            .cloned()
            .ok_or_else(|| Error::UnknownParameters(uuid.to_string()))?;

        if record.is_default {
            return Err(Error::DefaultParametersProtected(uuid.to_string()));
        }

        if record.is_global {
            let derived: Vec<&str> = self
                .records
                .values()
                .filter(|r| r.derived_from.as_deref() == Some(uuid))
                .map(|r| r.uuid.as_str())
                .collect();
            let in_use = self.last_used.values().any(|pointer| {
                pointer.parameter_uuid == uuid || derived.contains(&pointer.parameter_uuid.as_str())
            });
            if in_use {
                return Err(Error::ParametersInUse(uuid.to_string()));
            }
        }

        self.records.shift_remove(uuid);
        self.backend.remove(RUN_SECTION, &parameter_key(&record));
        for (artifact, pointer) in self.last_used.iter_mut() {
            let before = pointer.per_executor.len();
            pointer.per_executor.retain(|_, params| params != uuid);
            if pointer.per_executor.len() != before {
                let value = serde_json::to_value(&*pointer)?;
                self.backend.set(RUN_SECTION, &last_used_key(artifact), value);
            }
        }
        tracing::debug!("Deleted parameters {} ({})", record.uuid, record.name);
        self.commit()?;
        Ok(record)
    }

    /// Copy a global preset (or a Default set) into a custom preset of
    /// `artifact_uuid`, named `"<name> (<n>)"` with the lowest free `n`
    pub fn derive_custom(&mut self, source_uuid: &str, artifact_uuid: &str) -> Result<ParameterSet> {
        let source = self
            .records
            .get(source_uuid)
            .cloned()
            .ok_or_else(|| Error::UnknownParameters(source_uuid.to_string()))?;
        if source.is_custom() {
            return Err(Error::mismatch(
                source_uuid,
                "custom presets can only be derived from global presets",
            ));
        }

        let key = source.key();
        let taken: Vec<String> = self
            .list_parameters(&key, Some(artifact_uuid))
            .into_iter()
            .map(|r| r.name)
            .collect();
        let name = (1..)
            .map(|n| format!("{} ({})", source.name, n))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| format!("{} (copy)", source.name));

        let mut custom = ParameterSet::custom(&key, name, artifact_uuid, source.executor_params.clone())
            .with_working_dir(source.working_dir.clone());
        custom.derived_from = Some(source.uuid.clone());
        self.upsert_parameters(custom.clone())?;
        Ok(custom)
    }

    /// Record the pair most recently dispatched for an artifact
    pub fn set_last_used(&mut self, artifact_uuid: &str, executor_id: &str, parameter_uuid: &str) -> Result<()> {
        let pointer = self
            .last_used
            .entry(artifact_uuid.to_string())
            .or_insert_with(|| StoredLastUsed {
                executor_id: executor_id.to_string(),
                parameter_uuid: parameter_uuid.to_string(),
                per_executor: BTreeMap::new(),
            });
        pointer.executor_id = executor_id.to_string();
        pointer.parameter_uuid = parameter_uuid.to_string();
        pointer
            .per_executor
            .insert(executor_id.to_string(), parameter_uuid.to_string());

        let value = serde_json::to_value(&*pointer)?;
        self.backend.set(RUN_SECTION, &last_used_key(artifact_uuid), value);
        tracing::debug!(
            "Last used for {} is now ({}, {})",
            artifact_uuid,
            executor_id,
            parameter_uuid
        );
        self.commit()
    }

    /// The raw last-used pointer, without validation
    pub fn last_used(&self, artifact_uuid: &str) -> Option<LastUsed> {
        self.last_used
            .get(artifact_uuid)
            .map(|p| LastUsed::new(&p.executor_id, &p.parameter_uuid))
    }

    /// Last parameter set dispatched with `executor_id` for an artifact
    pub fn last_used_params(&self, artifact_uuid: &str, executor_id: &str) -> Option<&str> {
        self.last_used
            .get(artifact_uuid)
            .and_then(|p| p.per_executor.get(executor_id))
            .map(String::as_str)
    }

    /// Drop the pointer of one artifact
    pub fn remove_last_used(&mut self, artifact_uuid: &str) -> Result<bool> {
        if self.last_used.shift_remove(artifact_uuid).is_none() {
            return Ok(false);
        }
        self.backend.remove(RUN_SECTION, &last_used_key(artifact_uuid));
        tracing::debug!("Pruned last used pointer of {}", artifact_uuid);
        self.commit()?;
        Ok(true)
    }

    /// Drop pointers of artifacts for which `is_live` is false
    pub fn prune_last_used(&mut self, is_live: impl Fn(&str) -> bool) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .last_used
            .keys()
            .filter(|artifact| !is_live(artifact))
            .cloned()
            .collect();
        if stale.is_empty() {
            return Ok(stale);
        }
        for artifact in &stale {
            self.last_used.shift_remove(artifact);
            self.backend.remove(RUN_SECTION, &last_used_key(artifact));
        }
        self.commit()?;
        Ok(stale)
    }

    /// Flush pending writes
    pub fn flush(&mut self) -> Result<()> {
        self.commit()
    }

    fn commit(&mut self) -> Result<()> {
        self.backend.flush().map_err(|e| match e {
            Error::Persistence(_) => e,
            other => Error::Persistence(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::test_support::FailingStore;
    use serde_json::json;

    fn key() -> ParameterKey {
        ParameterKey::new("X1", "py", "file")
    }

    fn defaults() -> Map<String, Value> {
        match json!({"interact": false, "args": ""}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn store() -> ParameterStore {
        ParameterStore::load(Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_single_default_per_triple() {
        let mut store = store();
        let first = store.ensure_default(&key(), defaults()).unwrap();
        let second = store.ensure_default(&key(), Map::new()).unwrap();
        assert_eq!(first, second);

        let defaults_in_triple = store
            .iter()
            .filter(|r| r.key() == key() && r.is_default)
            .count();
        assert_eq!(defaults_in_triple, 1);
        assert_eq!(store.default_for(&key()).unwrap().executor_params, defaults());

        let rogue = ParameterSet::default_for(&key(), Map::new());
        assert!(matches!(
            store.upsert_parameters(rogue),
            Err(Error::ParameterMismatch { .. })
        ));
    }

    #[test]
    fn test_stored_triple_cannot_move() {
        let mut store = store();
        let uuid = store.ensure_default(&key(), defaults()).unwrap();

        let mut moved = store.get_parameters(&uuid).unwrap().clone();
        moved.executor_id = "X9".into();
        assert!(matches!(
            store.upsert_parameters(moved),
            Err(Error::ParameterMismatch { .. })
        ));
        assert_eq!(store.default_for(&key()).map(|r| r.uuid.clone()), Some(uuid.clone()));
        assert!(store.default_for(&ParameterKey::new("X9", "py", "file")).is_none());

        let preset = ParameterSet::global(&key(), "Fast", defaults());
        store.upsert_parameters(preset.clone()).unwrap();
        let mut moved = preset.clone();
        moved.context = "selection".into();
        assert!(store.upsert_parameters(moved).is_err());
        assert_eq!(store.get_parameters(&preset.uuid), Some(&preset));
    }

    #[test]
    fn test_upsert_then_get_round_trips() {
        let mut store = store();
        let record = ParameterSet::global(&key(), "Fast", defaults());
        store.upsert_parameters(record.clone()).unwrap();
        assert_eq!(store.get_parameters(&record.uuid), Some(&record));

        let mut renamed = record.clone();
        renamed.name = "Faster".into();
        store.upsert_parameters(renamed.clone()).unwrap();
        assert_eq!(store.get_parameters(&record.uuid), Some(&renamed));
    }

    #[test]
    fn test_list_parameters_orders_default_globals_customs() {
        let mut store = store();
        let fast = ParameterSet::global(&key(), "Fast", Map::new()).with_uuid("G1");
        store.upsert_parameters(fast).unwrap();
        store.ensure_default(&key(), defaults()).unwrap();

        let custom = store.derive_custom("G1", "A1").unwrap();
        assert_eq!(custom.name, "Fast (1)");
        assert_eq!(custom.derived_from.as_deref(), Some("G1"));

        let names = |artifact: Option<&str>| -> Vec<String> {
            store
                .list_parameters(&key(), artifact)
                .into_iter()
                .map(|r| r.name)
                .collect()
        };
        assert_eq!(names(Some("A1")), vec!["Default", "Fast", "Fast (1)"]);
        assert_eq!(names(Some("A2")), vec!["Default", "Fast"]);
        assert_eq!(names(None), vec!["Default", "Fast"]);
    }

    #[test]
    fn test_derived_names_take_lowest_free_counter() {
        let mut store = store();
        let fast = ParameterSet::global(&key(), "Fast", Map::new()).with_uuid("G1");
        store.upsert_parameters(fast).unwrap();

        let one = store.derive_custom("G1", "A1").unwrap();
        let two = store.derive_custom("G1", "A1").unwrap();
        assert_eq!(two.name, "Fast (2)");
        let other_artifact = store.derive_custom("G1", "A2").unwrap();
        assert_eq!(other_artifact.name, "Fast (1)");

        store.delete_parameters(&one.uuid).unwrap();
        assert_eq!(store.derive_custom("G1", "A1").unwrap().name, "Fast (1)");
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut store = store();
        store
            .upsert_parameters(ParameterSet::global(&key(), "Fast", Map::new()))
            .unwrap();
        let err = store
            .upsert_parameters(ParameterSet::global(&key(), "Fast", Map::new()))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateParameterName { .. }));

        // Same name in another triple is fine
        let other = ParameterKey::new("X2", "py", "file");
        store
            .upsert_parameters(ParameterSet::global(&other, "Fast", Map::new()))
            .unwrap();
    }

    #[test]
    fn test_delete_rules() {
        let mut store = store();
        let default_uuid = store.ensure_default(&key(), defaults()).unwrap();
        let fast = ParameterSet::global(&key(), "Fast", Map::new()).with_uuid("G1");
        store.upsert_parameters(fast).unwrap();
        let custom = store.derive_custom("G1", "A1").unwrap();

        assert!(matches!(
            store.delete_parameters(&default_uuid),
            Err(Error::DefaultParametersProtected(_))
        ));
        assert!(matches!(
            store.delete_parameters("missing"),
            Err(Error::UnknownParameters(_))
        ));

        store.set_last_used("A1", "X1", &custom.uuid).unwrap();
        assert!(matches!(
            store.delete_parameters("G1"),
            Err(Error::ParametersInUse(_))
        ));

        store.set_last_used("A1", "X1", &default_uuid).unwrap();
        store.delete_parameters("G1").unwrap();
        assert!(store.get_parameters("G1").is_none());
    }

    #[test]
    fn test_global_referenced_directly_is_in_use() {
        let mut store = store();
        let fast = ParameterSet::global(&key(), "Fast", Map::new()).with_uuid("G1");
        store.upsert_parameters(fast).unwrap();
        store.set_last_used("A2", "X1", "G1").unwrap();
        assert!(matches!(
            store.delete_parameters("G1"),
            Err(Error::ParametersInUse(_))
        ));
    }

    #[test]
    fn test_last_used_per_executor() {
        let mut store = store();
        store.set_last_used("A1", "X1", "P1").unwrap();
        store.set_last_used("A1", "X2", "P2").unwrap();

        assert_eq!(store.last_used("A1"), Some(LastUsed::new("X2", "P2")));
        assert_eq!(store.last_used_params("A1", "X1"), Some("P1"));
        assert_eq!(store.last_used_params("A1", "X3"), None);

        let stale = store.prune_last_used(|artifact| artifact != "A1").unwrap();
        assert_eq!(stale, vec!["A1".to_string()]);
        assert!(store.last_used("A1").is_none());
    }

    #[test]
    fn test_reload_from_backend() {
        let mut backend = MemoryStore::new();
        {
            let mut store = ParameterStore::load(Box::new(backend.clone()));
            store.ensure_default(&key(), defaults()).unwrap();
            store.set_last_used("A1", "X1", "P1").unwrap();
            // Copy what the store wrote into the shared backend
            for prefix in [PARAMETERS_PREFIX, LAST_USED_PREFIX] {
                for k in store.backend.keys_with_prefix(RUN_SECTION, prefix) {
                    let value = store.backend.get(RUN_SECTION, &k).unwrap();
                    backend.set(RUN_SECTION, &k, value);
                }
            }
        }
        backend.set(RUN_SECTION, "parameters/X1/py/file/broken", json!("not a record"));

        let reloaded = ParameterStore::load(Box::new(backend));
        assert!(reloaded.default_for(&key()).is_some());
        assert_eq!(reloaded.last_used("A1"), Some(LastUsed::new("X1", "P1")));
        assert_eq!(reloaded.iter().count(), 1);
    }

    #[test]
    fn test_failed_flush_reports_persistence_error() {
        let mut store = ParameterStore::load(Box::new(FailingStore::default()));
        let record = ParameterSet::global(&key(), "Fast", Map::new());
        let err = store.upsert_parameters(record.clone()).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(store.get_parameters(&record.uuid), Some(&record));
    }
}
