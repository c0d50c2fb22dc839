//! `proxystack env` — List the environment handed to the proxy.

use clap::Args;

use proxystack_common::env::{PROXY_ENV_OPTIONS, lookup_option};

use crate::commands::Cli;
use crate::output;

/// Arguments for the `env` command.
#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Show resolved values for the current configuration instead of the
    /// documented defaults.
    #[arg(long)]
    pub resolved: bool,

    /// Print sensitive values in clear text.
    #[arg(long)]
    pub show_secrets: bool,
}

/// Executes the `env` command.
///
/// # Errors
///
/// Returns an error if `--resolved` is given and the configuration cannot
/// be resolved.
pub fn execute(cli: &Cli, args: &EnvArgs) -> anyhow::Result<()> {
    if args.resolved {
        let environment = cli.stack_config()?.resolve_environment()?;
        for (key, value) in environment.vars() {
            let sensitive = lookup_option(key).is_some_and(|opt| opt.sensitive);
            println!(
                "{key}={}",
                output::redact(value, sensitive && !args.show_secrets)
            );
        }
        return Ok(());
    }

    println!("{:<24} {:<12} DESCRIPTION", "KEY", "DEFAULT");
    for opt in PROXY_ENV_OPTIONS {
        println!(
            "{:<24} {:<12} {}",
            opt.key,
            output::redact(opt.default, opt.sensitive && !args.show_secrets),
            opt.description
        );
    }
    Ok(())
}
