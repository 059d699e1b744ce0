//! Host settings and the keyed store the Run state persists to

pub mod settings;
pub mod store;

pub use settings::{RunSettings, SettingsEnv};
pub use store::{ConfigStore, JsonFileStore, MemoryStore, RUN_SECTION};
