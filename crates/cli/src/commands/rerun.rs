use anyhow::{Result, bail};
use tracing::debug;

use crate::host::{Host, RunMode};

use super::run::execute;

/// Replay the last `run` invocation recorded next to the parameter store
pub fn rerun_command(dry_run: bool) -> Result<()> {
    let last_run = {
        let host = Host::start(RunMode::DryRun)?;
        host.last_run()
    };
    let Some(last_run) = last_run else {
        bail!("Nothing has been run yet");
    };
    debug!("Re-running {:?}", last_run);
    execute(&last_run, dry_run)
}
