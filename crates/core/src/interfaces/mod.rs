//! Traits implemented outside the core
//!
//! Providers produce run inputs, executors consume them, viewers render
//! their results and configuration widget factories supply executor
//! parameters. The core holds all of them weakly.

pub mod config_group;
pub mod executor;
pub mod provider;
pub mod viewer;

pub use config_group::{
    ConfigurationWidgetFactory, DefaultsFactory, ExecutorConfigurationGroup,
    JsonConfigurationGroup,
};
pub use executor::{ExecutorError, HandlerRoute, RunExecutor, RunHandler};
pub use provider::RunConfigurationProvider;
pub use viewer::RunResultViewer;
