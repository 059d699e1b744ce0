use runbridge_core::ActionStatus;
use runbridge_core::RunCore;
use runbridge_core::models::{ParametersTable, RunDialog};

use crate::utils::determine_file_type;

/// Registered executors per `(extension, context)`, best first
pub fn print_executors(core: &RunCore, extension: Option<&str>, context: Option<&str>) {
    let registry = core.executor_registry();
    let context = context.map(|c| core.context_id(c));
    let mut printed = false;

    for (ext, ctx) in registry.input_keys() {
        if extension.is_some_and(|e| e != ext) || context.as_deref().is_some_and(|c| c != ctx) {
            continue;
        }
        printed = true;
        println!("📦 {}/{}", ext, ctx);
        for (position, executor_id) in core.executors_for(&ext, &ctx).iter().enumerate() {
            let priority = registry
                .configuration(executor_id, &ext, &ctx)
                .map_or(0, |config| config.priority);
            let name = registry.executor_name(executor_id).unwrap_or(executor_id);
            let marker = if position == 0 { "*" } else { " " };
            println!(
                "   {} {:<20} {} (priority {})",
                marker, executor_id, name, priority
            );
        }
    }

    if !printed {
        println!("No executors registered");
    }
}

pub fn print_parameters_table(table: &ParametersTable) {
    if table.is_empty() {
        println!("No parameter sets stored");
        return;
    }
    println!(
        "{:<36}  {:<20} {:<5} {:<10} {:<8} NAME",
        "UUID", "EXECUTOR", "EXT", "CONTEXT", "SCOPE"
    );
    for row in table.rows() {
        let scope = if row.is_default {
            "default"
        } else if row.is_global {
            "global"
        } else {
            "custom"
        };
        println!(
            "{:<36}  {:<20} {:<5} {:<10} {:<8} {}",
            row.parameters_uuid, row.executor_id, row.extension, row.context, scope, row.name
        );
    }
}

/// The three lists of the Run dialog, current rows marked with `>`
pub fn print_dialog(core: &RunCore, dialog: &RunDialog) {
    let Some(artifact) = dialog.artifacts().selected() else {
        println!("No file selected");
        return;
    };
    println!("📄 {} ({})", artifact.name, determine_file_type(&artifact.path));
    println!("   Path: {}", artifact.path.display());
    println!("   Context: {}", artifact.context);

    println!("\n🔧 Executors:");
    let current_executor = dialog.executors().current_index();
    for (index, row) in dialog.executors().rows().iter().enumerate() {
        let marker = if Some(index) == current_executor { ">" } else { " " };
        let handler = if row.has_handler { "" } else { " [no handler]" };
        println!("   {} {} ({}){}", marker, row.executor_id, row.name, handler);
    }

    println!("\n⚙️  Parameters:");
    let current_params = dialog.parameters().current_index();
    for (index, row) in dialog.parameters().rows().iter().enumerate() {
        let marker = if Some(index) == current_params { ">" } else { " " };
        println!("   {} {}  {}", marker, row.uuid, row.name);
        if Some(index) == current_params {
            if let Ok(params) = core.get_parameters(&row.uuid) {
                println!("       working dir: {}", params.working_dir.policy);
                for (key, value) in &params.executor_params {
                    println!("       {key} = {value}");
                }
            }
        }
    }

    if !dialog.run_enabled() {
        println!("\n⚠️  Run is not available for this selection");
    }
}

/// Which host actions are enabled for the focused file
pub fn print_action_status(status: &ActionStatus) {
    println!("\n▶️  Actions:");
    for action in &status.contexts {
        let state = if action.enabled { "enabled" } else { "disabled" };
        let re_run = if action.re_run_enabled { ", re-run" } else { "" };
        println!("   run {:<10} {}{}", action.context, state, re_run);
    }
    for action in status.executors.iter().filter(|a| a.enabled) {
        println!("   run {} in {}", action.context, action.executor_id);
    }
}
