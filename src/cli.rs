//! CLI domain: parse, route, and presentation only.
//! Inspection commands over the availability engine; no derive methods are run.

mod parse;
mod presentation;
mod route;

pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_groups_json, format_groups_text, format_rules_json, format_rules_text, GroupReport,
};
pub use route::RunContext;
