//! runbridge-core - Registry and dispatch core for running artifacts
//!
//! This crate decouples three kinds of plugins:
//! - providers, which own runnable artifacts (files, cells, selections)
//!   and build their run input on demand
//! - executors, which run those inputs through handlers routed by
//!   `(extension, context)`
//! - viewers, which render the results executors return
//!
//! [`RunCore`] owns the registries, the persisted parameter sets, the
//! focused artifact and the dispatcher.
pub mod actions;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod focus;
pub mod interfaces;
pub mod models;
pub mod params;
pub mod registry;
pub mod run_core;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use types::*;

pub use actions::ActionStatus;
pub use config::{ConfigStore, JsonFileStore, MemoryStore, RunSettings, SettingsEnv};
pub use dispatch::{DispatchReport, DispatchRequest};
pub use events::{RunEvent, SubscriptionId};
pub use focus::FocusRequests;
pub use interfaces::{
    ConfigurationWidgetFactory, DefaultsFactory, ExecutorConfigurationGroup, ExecutorError,
    HandlerRoute, JsonConfigurationGroup, RunConfigurationProvider, RunExecutor, RunHandler,
    RunResultViewer,
};
pub use run_core::RunCore;
