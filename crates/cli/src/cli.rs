use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{
    configure_command, executors_command, params_copy_command, params_delete_command,
    params_list_command, rerun_command, run_command,
};

#[derive(Parser, Debug)]
#[command(name = "runbridge")]
#[command(version, about = "Run files, cells and selections through pluggable executors")]
#[command(subcommand_required = true, arg_required_else_help = true)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug          Enable debug logging\n    RUNBRIDGE_STORE=<path>  Use another parameter store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a file, the cell around a line or a line range
    #[command(visible_alias = "r")]
    Run {
        /// File with optional line or range (e.g., job.py, job.py:12, job.py:3-8)
        target: String,

        /// Executor to run with instead of the last used one
        #[arg(short, long)]
        executor: Option<String>,

        /// Parameter set name or uuid
        #[arg(short, long)]
        params: Option<String>,

        /// Print the command without executing it
        #[arg(short, long)]
        dry_run: bool,
    },
    /// Repeat the previous run
    Rerun {
        /// Print the command without executing it
        #[arg(short, long)]
        dry_run: bool,
    },
    /// Show the run configuration of a file and optionally save a preset
    #[command(visible_alias = "c")]
    Configure {
        /// File to configure
        target: String,

        /// Executor to configure (defaults to the last used one)
        #[arg(short, long)]
        executor: Option<String>,

        /// Name of the preset to create or update
        #[arg(short, long)]
        name: Option<String>,

        /// Executor option as key=value; values are parsed as JSON when possible
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Working directory policy: file-dir, cwd or fixed
        #[arg(short, long)]
        working_dir: Option<String>,

        /// Directory used by the fixed policy
        #[arg(long)]
        path: Option<PathBuf>,

        /// Share the preset with every file of the same type
        #[arg(short, long)]
        global: bool,
    },
    /// List registered executors
    Executors {
        /// Only show this extension
        #[arg(long)]
        extension: Option<String>,

        /// Only show this context
        #[arg(long)]
        context: Option<String>,
    },
    /// Manage stored parameter sets
    Params {
        #[command(subcommand)]
        command: ParamsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ParamsCommand {
    /// List every stored parameter set
    #[command(visible_alias = "ls")]
    List {
        /// Only show sets of this executor
        #[arg(short, long)]
        executor: Option<String>,

        /// Sort column: extension, context or name
        #[arg(short, long, default_value = "extension")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Copy a preset into a preset bound to one file
    Copy {
        /// Parameter set uuid
        uuid: String,

        /// File the copy belongs to
        target: String,
    },
    /// Delete a preset
    #[command(visible_alias = "rm")]
    Delete {
        /// Parameter set uuid
        uuid: String,
    },
}

impl Commands {
    /// Execute the command
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Run {
                target,
                executor,
                params,
                dry_run,
            } => run_command(&target, executor.as_deref(), params.as_deref(), dry_run),
            Commands::Rerun { dry_run } => rerun_command(dry_run),
            Commands::Configure {
                target,
                executor,
                name,
                set,
                working_dir,
                path,
                global,
            } => configure_command(
                &target,
                executor.as_deref(),
                name.as_deref(),
                &set,
                working_dir.as_deref(),
                path,
                global,
            ),
            Commands::Executors { extension, context } => {
                executors_command(extension.as_deref(), context.as_deref())
            }
            Commands::Params { command } => match command {
                ParamsCommand::List {
                    executor,
                    sort,
                    desc,
                } => params_list_command(executor.as_deref(), &sort, desc),
                ParamsCommand::Copy { uuid, target } => params_copy_command(&uuid, &target),
                ParamsCommand::Delete { uuid } => params_delete_command(&uuid),
            },
        }
    }
}
