//! fdmux CLI library.
//!
//! This crate provides the core functionality for the fdmux CLI, including
//! configuration loading, the `run`, `validate`, and `design` commands, and
//! diagnostic plot rendering.

pub mod commands;
pub mod input;
pub mod plot;
