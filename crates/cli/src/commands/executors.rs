use anyhow::Result;

use crate::display::print_executors;
use crate::host::{Host, RunMode};

pub fn executors_command(extension: Option<&str>, context: Option<&str>) -> Result<()> {
    let host = Host::start(RunMode::DryRun)?;
    let extension = extension.map(|e| e.trim_start_matches('.'));
    print_executors(&host.core, extension, context);
    host.shutdown()
}
