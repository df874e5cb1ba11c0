use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::*;

#[derive(Parser, Clone, Debug)]
#[command(name = "vgm-rs", version, disable_help_subcommand(true))]
pub struct Opt {
    /// json settings file (created with defaults if missing)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub subcommand: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    Merge(merge::Opt),
    Probe(probe::Opt),
    Clean(clean::Opt),
    Rename(rename::Opt),
    ShellCompletions,
}
