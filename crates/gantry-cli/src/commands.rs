//! CLI command definitions.

use clap::{Subcommand, ValueEnum};
use gantry_core::pipeline::TriggerKind;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the configuration and resolve every job.
    Validate {
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List registered jobs.
    Jobs {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the fully merged definition of a job.
    Resolve {
        /// Job name.
        job: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Dispatch a trigger event and run its pipeline locally.
    Dispatch {
        /// Pipeline trigger.
        #[arg(value_enum)]
        trigger: TriggerArg,
        /// Changed file path; repeat for multiple files.
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<String>,
        /// Workspace root directory.
        #[arg(long, default_value = ".gantry-workspace")]
        workspace: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TriggerArg {
    Check,
    Gate,
}

impl From<TriggerArg> for TriggerKind {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::Check => TriggerKind::Check,
            TriggerArg::Gate => TriggerKind::Gate,
        }
    }
}
