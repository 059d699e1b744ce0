//! Small helpers shared across the crate

pub mod naming;
pub mod serde_helpers;

pub use naming::camel_case_to_snake_case;
