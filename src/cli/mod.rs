mod route;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use route::{join_args, route};

#[derive(Parser)]
#[command(name = "cmdgraph", version, about = "Grammar-driven command shell")]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Cli {
    /// Config file to use instead of ./cmdgraph.yml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level when CMDGRAPH_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub enum Commands {
    /// Interactive line shell; end a line with `?` for hints
    Shell,
    /// Print hints for a partial line as JSON
    Hint(HintArgs),
    /// Resolve and dispatch a single command line
    Run(RunArgs),
    /// List every registered command
    Commands,
}

#[derive(clap::Args)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct HintArgs {
    /// Buffer as typed so far; trailing spaces are significant
    #[arg(default_value = "")]
    pub line: String,
}

#[derive(clap::Args)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct RunArgs {
    /// Command and arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub args: Vec<String>,
}
