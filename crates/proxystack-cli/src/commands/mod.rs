//! CLI command definitions and dispatch.

pub mod env;
pub mod plan;
pub mod synth;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use proxystack_common::config::{FrontStrategy, StackConfig};
use proxystack_topology::stack::ProxyStack;

/// proxystack — declare the CipherStash proxy deployment topology.
#[derive(Parser, Debug)]
#[command(name = "proxystack", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a YAML stack configuration.
    #[arg(long, short, global = true, env = "PROXYSTACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Traffic-front strategy, overriding the configuration file.
    #[arg(long, global = true, value_parser = parse_strategy)]
    pub strategy: Option<FrontStrategy>,

    /// Use the documented defaults instead of this process's environment
    /// for recognized proxy options.
    #[arg(long, global = true)]
    pub ignore_env: bool,

    /// Emit logs as JSON on stderr.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the topology and emit its JSON snapshot.
    Synth(synth::SynthArgs),
    /// Display the creation order, or the diff against a previous snapshot.
    Plan(plan::PlanArgs),
    /// Build and validate the topology, reporting insecure defaults.
    Validate(validate::ValidateArgs),
    /// List the environment options handed to the proxy.
    Env(env::EnvArgs),
}

fn parse_strategy(value: &str) -> Result<FrontStrategy, String> {
    value.parse().map_err(|e: proxystack_common::error::TopologyError| e.to_string())
}

impl Cli {
    /// Loads the configuration file (if any) and applies flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn stack_config(&self) -> anyhow::Result<StackConfig> {
        let mut config = match &self.config {
            Some(path) => StackConfig::load(path)?,
            None => StackConfig::default(),
        };
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if self.ignore_env {
            config.use_process_env = false;
        }
        Ok(config)
    }

    /// Builds the stack described by the configuration and flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the topology
    /// fails validation.
    pub fn build_stack(&self) -> anyhow::Result<ProxyStack> {
        let config = self.stack_config()?;
        Ok(ProxyStack::build(&config)?)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Synth(args) => synth::execute(&cli, args),
        Command::Plan(args) => plan::execute(&cli, args),
        Command::Validate(args) => validate::execute(&cli, args),
        Command::Env(args) => env::execute(&cli, args),
    }
}
