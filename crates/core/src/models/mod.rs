//! Order-preserving projections of the registries for the Run dialogs
//!
//! Models are rebuilt from a [`crate::RunCore`] on demand. They never
//! mutate the core; the host re-syncs them when it observes a
//! [`crate::events::RunEvent`].

pub mod artifacts;
pub mod dialog;
pub mod executors;
pub mod parameters;
pub mod table;

pub use artifacts::{ArtifactRow, ArtifactsModel};
pub use dialog::{DialogState, RunDialog};
pub use executors::{ExecutorRow, ExecutorsModel};
pub use parameters::{ParameterRow, ParametersModel};
pub use table::{ParametersTable, SortColumn, SortOrder, TableRow};
