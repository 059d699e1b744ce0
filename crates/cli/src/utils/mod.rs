pub mod file;
pub mod parser;

pub use file::determine_file_type;
pub use parser::{Location, Target, parse_target};
