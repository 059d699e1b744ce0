use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

use runbridge_core::models::RunDialog;
use runbridge_core::{ParameterSet, RunCore, WorkingDirOpts, WorkingDirPolicy};

use crate::display::{print_action_status, print_dialog};
use crate::host::{Host, RunMode};
use crate::utils::parse_target;

/// Edits requested on the command line for a named preset
struct PresetEdit<'a> {
    name: &'a str,
    assignments: &'a [String],
    working_dir: Option<&'a str>,
    path: Option<PathBuf>,
    global: bool,
}

pub fn configure_command(
    target_arg: &str,
    executor: Option<&str>,
    name: Option<&str>,
    set: &[String],
    working_dir: Option<&str>,
    path: Option<PathBuf>,
    global: bool,
) -> Result<()> {
    let target = parse_target(target_arg)?;
    let mut host = Host::start(RunMode::DryRun)?;
    let (uuid, _) = host.open(&target)?;

    let mut dialog = RunDialog::new(&host.core);
    if let Some(executor_id) = executor {
        let position = dialog
            .executors()
            .position_of(executor_id)
            .with_context(|| format!("Executor {} cannot run {}", executor_id, target_arg))?;
        dialog.select_executor(&host.core, position)?;
    }

    match name {
        Some(name) => {
            let edit = PresetEdit {
                name,
                assignments: set,
                working_dir,
                path,
                global,
            };
            let preset = save_preset(&mut host.core, &dialog, &uuid, edit)?;
            host.core
                .set_last_used(&uuid, &preset.executor_id, &preset.uuid)?;
            println!("✅ Saved '{}' ({})\n", preset.name, preset.uuid);
            dialog.sync(&host.core);
        }
        None if !set.is_empty() || working_dir.is_some() || path.is_some() => {
            bail!("--set, --working-dir and --path need a preset --name");
        }
        None => {}
    }

    print_dialog(&host.core, &dialog);
    print_action_status(&host.core.action_status());
    host.shutdown()
}

/// Create or update the named preset of the dialog's current executor,
/// starting from the currently selected parameters
fn save_preset(
    core: &mut RunCore,
    dialog: &RunDialog,
    artifact_uuid: &str,
    edit: PresetEdit<'_>,
) -> Result<ParameterSet> {
    let key = dialog
        .parameters()
        .key()
        .cloned()
        .context("No executor can run this file")?;
    let base = dialog
        .parameters()
        .current()
        .map(|row| row.uuid.clone())
        .context("No parameters are selected")?;
    let base = core.get_parameters(&base)?.clone();

    let existing = core
        .list_parameters(&key.executor_id, &key.extension, &key.context, Some(artifact_uuid))
        .into_iter()
        .find(|p| p.name == edit.name && !p.is_default);
    let mut record = match existing {
        Some(record) => {
            debug!("Updating parameters {}", record.uuid);
            record
        }
        None if edit.global => {
            ParameterSet::global(&key, edit.name, base.executor_params.clone())
                .with_working_dir(base.working_dir.clone())
        }
        None => ParameterSet::custom(&key, edit.name, artifact_uuid, base.executor_params.clone())
            .with_working_dir(base.working_dir.clone()),
    };

    for assignment in edit.assignments {
        let (option, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected KEY=VALUE, got '{}'", assignment))?;
        let option = option.trim();
        let value = parse_value(&record.executor_params, option, value);
        record.executor_params.insert(option.to_string(), value);
    }

    match (edit.working_dir, edit.path) {
        (Some(policy), path) => {
            let policy: WorkingDirPolicy = serde_json::from_value(Value::String(policy.to_string()))
                .with_context(|| format!("Unknown working directory policy '{}'", policy))?;
            if policy == WorkingDirPolicy::Fixed && path.is_none() && record.working_dir.path.is_none()
            {
                bail!("The fixed working directory policy needs --path");
            }
            record.working_dir = WorkingDirOpts {
                policy,
                path: path.or(record.working_dir.path.take()),
            };
        }
        (None, Some(path)) => record.working_dir = WorkingDirOpts::fixed(path),
        (None, None) => {}
    }

    core.upsert_parameters(record.clone())?;
    Ok(record)
}

/// String options stay strings; anything else is read as JSON when it parses
fn parse_value(current: &Map<String, Value>, option: &str, raw: &str) -> Value {
    if matches!(current.get(option), Some(Value::String(_))) {
        return Value::String(raw.to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value_keeps_string_options() {
        let Value::Object(current) = json!({ "args": "", "interact": false }) else {
            unreachable!()
        };
        assert_eq!(parse_value(&current, "args", "5"), json!("5"));
        assert_eq!(parse_value(&current, "interact", "true"), json!(true));
        assert_eq!(parse_value(&current, "timeout", "30"), json!(30));
        assert_eq!(parse_value(&current, "mode", "fast"), json!("fast"));
    }
}
