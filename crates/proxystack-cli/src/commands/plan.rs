//! `proxystack plan` — Display the planned topology before provisioning.

use std::path::PathBuf;

use clap::Args;

use proxystack_topology::snapshot::{self, TopologySnapshot};

use crate::commands::Cli;
use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Snapshot written by `synth`; when given, only the differences
    /// against it are shown.
    #[arg(long)]
    pub previous: Option<PathBuf>,
}

/// Executes the `plan` command.
///
/// Builds the stack, resolves the creation order, and prints either the
/// full plan or the changes relative to a previous snapshot.
///
/// # Errors
///
/// Returns an error if the stack fails to build or the previous snapshot
/// cannot be loaded.
pub fn execute(cli: &Cli, args: &PlanArgs) -> anyhow::Result<()> {
    let stack = cli.build_stack()?;

    println!(
        "Deployment Plan for: {} ({} strategy)",
        stack.name(),
        stack.front().strategy
    );
    println!("{}", output::rule(48));
    println!();

    if let Some(ref path) = args.previous {
        let previous = TopologySnapshot::load(path)?;
        let changes = snapshot::diff(&previous, &stack.snapshot());
        if changes.is_empty() {
            println!("  No changes. The declared topology matches the snapshot.");
        } else {
            for change in &changes {
                println!("  {change}");
            }
            println!();
            println!("  {} change(s).", changes.len());
        }
        return Ok(());
    }

    let order = stack.deployment_order()?;
    for id in &order {
        if let Some(resource) = stack.topology().get(id) {
            println!("  + {} {id}", resource.kind());
            println!("      {}", output::describe(resource));
        }
    }

    println!();
    println!("  {} resource(s) will be declared.", order.len());

    if !stack.warnings().is_empty() {
        println!();
        println!("  Warnings:");
        for warning in stack.warnings() {
            println!("    {warning}");
        }
    }

    Ok(())
}
