//! Parameter store: Default sets, global and custom presets, last-used pointers

pub mod store;

pub use store::ParameterStore;
