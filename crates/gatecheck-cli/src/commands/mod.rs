//! CLI subcommand implementations.

pub mod audit;
