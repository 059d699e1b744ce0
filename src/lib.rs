//! runbridge-suite - cross-crate integration tests for runbridge
//!
//! The package carries no code of its own. Tests under `tests/` drive the
//! core through its public API with in-memory plugins and a JSON store.
pub use runbridge_core::*;
