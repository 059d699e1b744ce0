use anyhow::{Result, bail};
use std::path::PathBuf;

use runbridge_core::types::run_context;

/// Which part of a file a target points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The whole file
    File,
    /// The cell containing a line (1-based)
    Line(usize),
    /// An inclusive line range, run as a selection
    Range(usize, usize),
}

impl Location {
    /// Context identifier the location runs in
    pub fn context(&self) -> &'static str {
        match self {
            Location::File => run_context::FILE,
            Location::Line(_) => run_context::CELL,
            Location::Range(..) => run_context::SELECTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub path: PathBuf,
    pub location: Location,
}

/// Parse `path`, `path:LINE` or `path:START-END`
pub fn parse_target(arg: &str) -> Result<Target> {
    let Some(colon_pos) = arg.rfind(':') else {
        return Ok(whole_file(arg));
    };
    let path_part = &arg[..colon_pos];
    let line_part = &arg[colon_pos + 1..];
    if path_part.is_empty() {
        return Ok(whole_file(arg));
    }

    let location = match line_part.split_once('-') {
        Some((start, end)) => match (start.parse::<usize>(), end.parse::<usize>()) {
            (Ok(start), Ok(end)) => {
                if start == 0 || end < start {
                    bail!("Invalid line range '{}' in {}", line_part, arg);
                }
                Location::Range(start, end)
            }
            // Not a range, treat the whole thing as a path
            _ => return Ok(whole_file(arg)),
        },
        None => match line_part.parse::<usize>() {
            Ok(0) => bail!("Line numbers start at 1: {}", arg),
            Ok(line) => Location::Line(line),
            Err(_) => return Ok(whole_file(arg)),
        },
    };

    Ok(Target {
        path: PathBuf::from(path_part),
        location,
    })
}

fn whole_file(arg: &str) -> Target {
    Target {
        path: PathBuf::from(arg),
        location: Location::File,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(parse_target("src/job.py").unwrap(), Target {
            path: "src/job.py".into(),
            location: Location::File,
        });
        assert_eq!(
            parse_target("job.py:12").unwrap().location,
            Location::Line(12)
        );
        assert_eq!(
            parse_target("job.py:3-7").unwrap().location,
            Location::Range(3, 7)
        );
        assert_eq!(
            parse_target(r"C:\work\job.py").unwrap().path,
            PathBuf::from(r"C:\work\job.py")
        );
        assert_eq!(
            parse_target("notes:draft.py").unwrap().location,
            Location::File
        );
    }

    #[test]
    fn test_invalid_lines() {
        assert!(parse_target("job.py:0").is_err());
        assert!(parse_target("job.py:7-3").is_err());
    }

    #[test]
    fn test_location_contexts() {
        assert_eq!(Location::File.context(), "file");
        assert_eq!(Location::Line(1).context(), "cell");
        assert_eq!(Location::Range(1, 2).context(), "selection");
    }
}
