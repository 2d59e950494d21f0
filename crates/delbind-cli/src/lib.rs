//! Pipeline wiring for the `delbind` binary.

pub mod commands;
pub mod config;
