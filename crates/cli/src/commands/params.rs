use anyhow::{Context, Result};
use serde_json::Value;

use runbridge_core::models::{ParametersTable, SortColumn, SortOrder};

use crate::display::print_parameters_table;
use crate::host::{Host, RunMode};
use crate::utils::parse_target;

pub fn params_list_command(executor: Option<&str>, sort: &str, desc: bool) -> Result<()> {
    let column: SortColumn = serde_json::from_value(Value::String(sort.to_string()))
        .with_context(|| format!("Unknown sort column '{}'", sort))?;
    let order = if desc {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };

    let host = Host::start(RunMode::DryRun)?;
    let mut table = ParametersTable::new(&host.core);
    if let Some(executor_id) = executor {
        table = table.with_executor(&host.core, executor_id);
    }
    table.sort_by(column, order);
    print_parameters_table(&table);
    host.shutdown()
}

pub fn params_copy_command(source_uuid: &str, target_arg: &str) -> Result<()> {
    let target = parse_target(target_arg)?;
    let mut host = Host::start(RunMode::DryRun)?;
    let (artifact_uuid, _) = host.open(&target)?;

    let custom = host
        .core
        .derive_custom_parameters(source_uuid, &artifact_uuid)
        .with_context(|| format!("Failed to copy parameters {}", source_uuid))?;
    println!(
        "✅ Created '{}' ({}) for {}",
        custom.name,
        custom.uuid,
        target.path.display()
    );
    host.shutdown()
}

pub fn params_delete_command(uuid: &str) -> Result<()> {
    let mut host = Host::start(RunMode::DryRun)?;
    let removed = host
        .core
        .delete_parameters(uuid)
        .with_context(|| format!("Failed to delete parameters {}", uuid))?;
    println!("🗑️  Deleted '{}' ({})", removed.name, removed.uuid);
    host.shutdown()
}
