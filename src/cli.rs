// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "capstan")]
#[command(about = "Rolling deployments and scheduler action graphs for staged apps")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to capstan.yml discovery in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new capstan.yml configuration file
    Init {
        /// Base URL of the platform file server
        #[arg(long)]
        file_server_url: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration and resolve every lifecycle bundle
    Check,

    /// Print the action graph for a workload as JSON
    Plan {
        #[command(subcommand)]
        workload: PlanCommand,
    },
}

#[derive(Subcommand)]
pub enum PlanCommand {
    /// A one-off task running a buildpack droplet
    Task {
        /// Workload description (YAML)
        file: PathBuf,
    },

    /// A long-running process running a container image
    Lrp {
        /// Workload description (YAML)
        file: PathBuf,
    },
}
