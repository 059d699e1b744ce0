pub mod formatter;

pub use formatter::{print_action_status, print_dialog, print_executors, print_parameters_table};
