//! CLI command implementations

pub mod design;
pub mod json_output;
pub mod report;
pub mod run;
pub mod validate;
