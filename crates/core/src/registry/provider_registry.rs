//! Maps `(extension, context)` to the providers that produce input for it

use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::interfaces::RunConfigurationProvider;
use crate::types::SupportedExtensionContexts;

type InputKey = (String, String);

#[derive(Clone)]
struct ProviderSlot {
    provider: Weak<dyn RunConfigurationProvider>,
    is_primary: bool,
    is_shown: bool,
}

/// A context a provider declared for one extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredContext {
    pub context: String,
    pub is_primary: bool,
    pub is_shown: bool,
}

#[derive(Default)]
pub struct ProviderRegistry {
    entries: IndexMap<InputKey, IndexMap<String, ProviderSlot>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<_> = self
            .entries
            .iter()
            .map(|(key, slots)| (key, slots.keys().collect::<Vec<_>>()))
            .collect();
        f.debug_struct("ProviderRegistry")
            .field("entries", &entries)
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `provider` to every declared `(extension, context)` pair.
    ///
    /// Registering the same declarations again leaves membership unchanged.
    /// Declaring a second primary context for an extension is an error and
    /// nothing is registered.
    pub fn register(
        &mut self,
        provider: &Arc<dyn RunConfigurationProvider>,
        configurations: &[SupportedExtensionContexts],
    ) -> Result<()> {
        let provider_id = provider.provider_id().to_string();
        self.check_primary(&provider_id, configurations)?;

        for config in configurations {
            for ext_ctx in &config.contexts {
                let key = (config.input_extension.clone(), ext_ctx.context.id());
                tracing::debug!(
                    "Provider {} supports ({}, {})",
                    provider_id,
                    key.0,
                    key.1
                );
                self.entries.entry(key).or_default().insert(
                    provider_id.clone(),
                    ProviderSlot {
                        provider: Arc::downgrade(provider),
                        is_primary: ext_ctx.is_primary,
                        is_shown: ext_ctx.is_shown,
                    },
                );
            }
        }
        Ok(())
    }

    fn check_primary(
        &self,
        provider_id: &str,
        configurations: &[SupportedExtensionContexts],
    ) -> Result<()> {
        for config in configurations {
            let mut primaries: Vec<String> = config
                .contexts
                .iter()
                .filter(|c| c.is_primary)
                .map(|c| c.context.id())
                .collect();
            for declared in self.contexts_of(provider_id, &config.input_extension) {
                let redeclared = config
                    .contexts
                    .iter()
                    .any(|c| c.context.id() == declared.context);
                if declared.is_primary && !redeclared {
                    primaries.push(declared.context);
                }
            }
            primaries.sort();
            primaries.dedup();
            if primaries.len() > 1 {
                return Err(Error::RegistryError(format!(
                    "provider {} declares several primary contexts for '{}': {}",
                    provider_id,
                    config.input_extension,
                    primaries.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Remove `provider_id` from the declared pairs
    pub fn deregister(&mut self, provider_id: &str, configurations: &[SupportedExtensionContexts]) {
        for config in configurations {
            for ext_ctx in &config.contexts {
                let key = (config.input_extension.clone(), ext_ctx.context.id());
                if let Some(slots) = self.entries.get_mut(&key) {
                    slots.shift_remove(provider_id);
                    if slots.is_empty() {
                        self.entries.shift_remove(&key);
                    }
                }
            }
        }
    }

    /// Remove `provider_id` from every pair
    pub fn deregister_owner(&mut self, provider_id: &str) {
        for slots in self.entries.values_mut() {
            slots.shift_remove(provider_id);
        }
        self.entries.retain(|_, slots| !slots.is_empty());
    }

    /// Drop slots whose provider has been dropped
    pub fn prune_dead(&mut self) {
        for slots in self.entries.values_mut() {
            slots.retain(|_, slot| slot.provider.strong_count() > 0);
        }
        self.entries.retain(|_, slots| !slots.is_empty());
    }

    /// Snapshot of the live providers for a pair
    pub fn providers_for(
        &self,
        extension: &str,
        context: &str,
    ) -> Vec<Arc<dyn RunConfigurationProvider>> {
        self.slots(extension, context)
            .map(|slots| slots.values().filter_map(|s| s.provider.upgrade()).collect())
            .unwrap_or_default()
    }

    /// Whether a live provider `provider_id` declared the pair
    pub fn supports(&self, provider_id: &str, extension: &str, context: &str) -> bool {
        self.slot(provider_id, extension, context)
            .is_some_and(|slot| slot.provider.strong_count() > 0)
    }

    /// Whether `provider_id` declared `context` as primary for `extension`
    pub fn is_primary(&self, provider_id: &str, extension: &str, context: &str) -> bool {
        self.slot(provider_id, extension, context)
            .is_some_and(|slot| slot.is_primary)
    }

    /// Contexts `provider_id` declared for `extension`, in declaration order
    pub fn contexts_of(&self, provider_id: &str, extension: &str) -> Vec<DeclaredContext> {
        self.entries
            .iter()
            .filter(|((ext, _), _)| ext == extension)
            .filter_map(|((_, ctx), slots)| {
                slots.get(provider_id).map(|slot| DeclaredContext {
                    context: ctx.clone(),
                    is_primary: slot.is_primary,
                    is_shown: slot.is_shown,
                })
            })
            .collect()
    }

    /// Every pair with at least one registered provider
    pub fn supported_pairs(&self) -> Vec<(String, String)> {
        self.entries.keys().cloned().collect()
    }

    /// Number of providers registered for a pair, live or not
    pub fn membership(&self, extension: &str, context: &str) -> usize {
        self.slots(extension, context).map_or(0, IndexMap::len)
    }

    fn slots(&self, extension: &str, context: &str) -> Option<&IndexMap<String, ProviderSlot>> {
        self.entries
            .get(&(extension.to_string(), context.to_string()))
    }

    fn slot(&self, provider_id: &str, extension: &str, context: &str) -> Option<&ProviderSlot> {
        self.slots(extension, context)
            .and_then(|slots| slots.get(provider_id))
    }
}
