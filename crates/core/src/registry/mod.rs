//! Registries of artifacts, providers, executors and viewers
//!
//! External objects are held through [`std::sync::Weak`] references so that
//! dropping a provider, executor or viewer removes it from every lookup.
//! Each registry also indexes membership by owner id for explicit teardown.

pub mod executor_registry;
pub mod metadata_store;
pub mod provider_registry;
pub mod viewer_registry;

pub use executor_registry::ExecutorRegistry;
pub use metadata_store::MetadataStore;
pub use provider_registry::{DeclaredContext, ProviderRegistry};
pub use viewer_registry::ViewerRegistry;
