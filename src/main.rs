// ABOUTME: Entry point for the capstan CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use capstan::config::{self, Config};
use capstan::error::{Error, Result};
use capstan::scheduler::{
    ActionBuilder, ActionGraph, BuildpackTaskActionBuilder, DockerLrpActionBuilder,
    EnvironmentVariable, LrpSpec, TaskSpec,
};
use clap::Parser;
use cli::{Cli, Commands, PlanCommand};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// A task workload file: the task plus its collected environment.
#[derive(Debug, Deserialize)]
struct TaskWorkload {
    #[serde(flatten)]
    task: TaskSpec,
    #[serde(default)]
    environment: Vec<EnvironmentVariable>,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init {
            file_server_url,
            force,
        } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, file_server_url.as_deref(), force)?;
            println!("Created {}", config::CONFIG_FILENAME);
            Ok(())
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            check(&config)
        }
        Commands::Plan { workload } => {
            let config = load_config(cli.config.as_deref())?;
            let graph = match workload {
                PlanCommand::Task { file } => plan_task(&config, &file)?,
                PlanCommand::Lrp { file } => plan_lrp(&config, &file)?,
            };
            println!("{}", serde_json::to_string_pretty(&graph)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&env::current_dir()?),
    }
}

fn check(config: &Config) -> Result<()> {
    let settings = config.scheduler_settings()?;
    if settings.lifecycle_bundles.is_empty() {
        return Err(Error::InvalidConfig(
            "no lifecycle bundles configured".to_string(),
        ));
    }

    println!("Image delivery: {}", settings.image_delivery_mode);
    println!("Default app port: {}", settings.default_app_port);
    println!(
        "Platform options: {}",
        if settings.platform_options().is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "Deployments retained per app: {}",
        config.deployments.max_retained_per_app
    );
    for (key, uri) in settings
        .lifecycle_bundles
        .entries()
        .map_err(|e| Error::InvalidConfig(e.to_string()))?
    {
        println!("Lifecycle {key}: {uri}");
    }
    Ok(())
}

fn plan_task(config: &Config, file: &Path) -> Result<ActionGraph> {
    let settings = config.scheduler_settings()?;
    let workload: TaskWorkload = serde_yaml::from_str(&std::fs::read_to_string(file)?)?;

    let builder =
        BuildpackTaskActionBuilder::new(&settings, &workload.task, &workload.environment);
    debug!(task = %workload.task.name, stack = %builder.stack(), delivery = ?builder.delivery(), "planning task");
    Ok(builder.build()?)
}

fn plan_lrp(config: &Config, file: &Path) -> Result<ActionGraph> {
    let settings = config.scheduler_settings()?;
    let lrp: LrpSpec = serde_yaml::from_str(&std::fs::read_to_string(file)?)?;

    let builder = DockerLrpActionBuilder::new(&settings, &lrp)?;
    debug!(root_fs = %builder.root_fs(), delivery = ?builder.delivery(), "planning lrp");
    Ok(builder.build()?)
}
