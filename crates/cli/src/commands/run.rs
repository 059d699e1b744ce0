use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use runbridge_core::{DispatchReport, DispatchRequest, PossibleRunResult, RunCore};

use crate::host::{Host, LastRun, RunMode};
use crate::utils::parse_target;

pub fn run_command(
    target_arg: &str,
    executor: Option<&str>,
    params: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let last_run = LastRun {
        target: target_arg.to_string(),
        executor: executor.map(str::to_string),
        parameters: params.map(str::to_string),
    };
    execute(&last_run, dry_run)
}

/// Run an invocation and remember it for `rerun`
pub(crate) fn execute(last_run: &LastRun, dry_run: bool) -> Result<()> {
    let target = parse_target(&last_run.target)?;
    let mode = if dry_run { RunMode::DryRun } else { RunMode::Execute };
    let mut host = Host::start(mode)?;

    let (uuid, context) = host.open(&target)?;
    debug!("Running {} ({}) in context {}", target.path.display(), uuid, context);

    let report = dispatch(
        &mut host.core,
        &uuid,
        &context,
        last_run.executor.as_deref(),
        last_run.parameters.as_deref(),
    )
    .with_context(|| format!("Failed to run {}", last_run.target))?;
    info!(
        "Ran {} with {} ({})",
        report.context, report.executor_id, report.parameters_uuid
    );

    host.remember(last_run)?;
    report.display_all();
    let exit_code = exit_code(&report);
    host.shutdown()?;

    if let Some(code) = exit_code {
        std::process::exit(code);
    }
    Ok(())
}

fn dispatch(
    core: &mut RunCore,
    uuid: &str,
    context: &str,
    executor: Option<&str>,
    params: Option<&str>,
) -> Result<DispatchReport> {
    let status = core.action_status();
    if !status.context(context).is_some_and(|action| action.enabled) {
        bail!("Running a {} is not available for this file", context);
    }

    let Some(params) = params else {
        let report = match executor {
            Some(executor_id) => core.run_in_executor(executor_id, Some(context))?,
            None if status.context(context).is_some_and(|action| action.is_primary) => {
                core.run_focused()?
            }
            None => core.run_context(context, None)?,
        };
        return Ok(report);
    };

    let metadata = core
        .metadata(uuid)
        .with_context(|| format!("Unknown file {}", uuid))?;
    let (extension, own_context) = metadata.input_key();
    let executor_id = match executor {
        Some(executor_id) => executor_id.to_string(),
        None if context == own_context => core.resolve_last_used(uuid)?.executor_id,
        None => core
            .default_executor_for(&extension, context)
            .with_context(|| format!("No executor can run a {} of .{} files", context, extension))?,
    };

    let preset = core
        .list_parameters(&executor_id, &extension, context, Some(uuid))
        .into_iter()
        .find(|p| p.uuid == params || p.name == params)
        .with_context(|| {
            format!(
                "No parameter set '{}' for {} ({}/{})",
                params, executor_id, extension, context
            )
        })?;

    let request = DispatchRequest::new(uuid, executor_id, preset.uuid).with_context(context);
    Ok(core.dispatch(request)?)
}

/// Exit code of the first failed process, if any
fn exit_code(report: &DispatchReport) -> Option<i32> {
    report.results.iter().find_map(|result| match result {
        PossibleRunResult::Result(result) if result.is_error => Some(
            result
                .run_output
                .get("exit_code")
                .and_then(serde_json::Value::as_i64)
                .and_then(|code| i32::try_from(code).ok())
                .unwrap_or(1),
        ),
        PossibleRunResult::Result(_) => None,
        PossibleRunResult::Error(_) => Some(1),
    })
}
