pub mod configure;
pub mod executors;
pub mod params;
pub mod rerun;
pub mod run;

pub use configure::configure_command;
pub use executors::executors_command;
pub use params::{params_copy_command, params_delete_command, params_list_command};
pub use rerun::rerun_command;
pub use run::run_command;
