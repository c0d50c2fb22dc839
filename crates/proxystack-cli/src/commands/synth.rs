//! `proxystack synth` — Emit the topology snapshot as JSON.

use std::path::PathBuf;

use clap::Args;

use crate::commands::Cli;

/// Arguments for the `synth` command.
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Write the snapshot to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `synth` command.
///
/// # Errors
///
/// Returns an error if the stack fails to build or the output cannot be
/// written.
pub fn execute(cli: &Cli, args: &SynthArgs) -> anyhow::Result<()> {
    let stack = cli.build_stack()?;
    let json = stack.snapshot().to_json()?;

    if let Some(ref path) = args.output {
        tracing::info!(path = %path.display(), "writing snapshot");
        std::fs::write(path, &json)?;
        println!(
            "Synthesized {} ({} entities) -> {}",
            stack.name(),
            stack.topology().len(),
            path.display()
        );
    } else {
        println!("{json}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use proxystack_topology::snapshot::TopologySnapshot;

    use super::*;

    #[test]
    fn synth_writes_loadable_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stack.json");
        let path_str = path.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["proxystack", "synth", "-o", path_str.as_str()])
            .expect("parse");
        let crate::commands::Command::Synth(ref args) = cli.command else {
            unreachable!("parsed synth");
        };
        execute(&cli, args).expect("synth");

        let snapshot = TopologySnapshot::load(&path).expect("load");
        assert_eq!(snapshot, cli.build_stack().expect("build").snapshot());
    }
}
