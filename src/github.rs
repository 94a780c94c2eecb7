//! Integration with the CI host log protocol.
//!
//! The CI runner consumes line-prefixed directives from the action's standard
//! output: `::debug::`/`::warning::`/`::error::` annotate log lines,
//! `::add-mask::` registers a secret with the log redactor and
//! `::set-output name=…::` publishes a value for downstream pipeline steps.

pub mod commands;
pub mod layer;
