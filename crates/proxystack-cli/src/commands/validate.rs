//! `proxystack validate` — Build the topology and report insecure defaults.

use clap::Args;

use crate::commands::Cli;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Fail when any insecure default is in use.
    #[arg(long)]
    pub deny_warnings: bool,
}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error if the topology is invalid, or if warnings are denied
/// and at least one insecure default is in use.
pub fn execute(cli: &Cli, args: &ValidateArgs) -> anyhow::Result<()> {
    let stack = cli.build_stack()?;

    println!(
        "{}: {} entities, {} strategy, port {}",
        stack.name(),
        stack.topology().len(),
        stack.front().strategy,
        stack.listener_port().unwrap_or_default()
    );

    let warnings = stack.warnings();
    if warnings.is_empty() {
        println!("  no insecure defaults in use");
        return Ok(());
    }
    for warning in warnings {
        println!("  warning: {warning}");
    }
    if args.deny_warnings {
        anyhow::bail!("{} insecure default(s) in use", warnings.len());
    }
    Ok(())
}
