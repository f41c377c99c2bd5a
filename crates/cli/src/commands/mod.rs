//! CLI subcommands

pub mod nodes;
pub mod score;
