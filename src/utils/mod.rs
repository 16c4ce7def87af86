//! Utility modules for the scanner front end

pub mod target_parser;

pub use target_parser::{parse_target_list, ParsedTarget, TargetParser, TargetType};
