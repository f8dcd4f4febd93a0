use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use manifest_core::ManifestType;
use tracing_subscriber::EnvFilter;

use manifestctl::cmd_check;
use manifestctl::cmd_parse;

#[derive(Parser, Debug)]
#[command(name = "manifestctl", version, about = "Firmware manifest XML tool")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse one manifest and print the record
    Parse {
        /// Manifest type: pfm, cfm or pcd
        #[arg(long)]
        kind: ManifestType,
        file: PathBuf,
    },
    /// Validate manifests and report each one
    Check {
        /// Manifest type: pfm, cfm or pcd
        #[arg(long)]
        kind: ManifestType,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let Cli { verbose, json, cmd } = Cli::parse();

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cmd {
        Cmd::Parse { kind, file } => cmd_parse::run(kind, file, json)?,
        Cmd::Check { kind, files } => cmd_check::run(kind, files, json)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_args() {
        let cli = Cli::parse_from(["manifestctl", "parse", "--kind", "PFM", "fw.xml"]);
        assert!(!cli.json);
        match cli.cmd {
            Cmd::Parse { kind, file } => {
                assert_eq!(kind, ManifestType::Pfm);
                assert_eq!(file, PathBuf::from("fw.xml"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn check_takes_many_files() {
        let cli = Cli::parse_from([
            "manifestctl",
            "-vv",
            "--json",
            "check",
            "--kind",
            "pcd",
            "a.xml",
            "b.xml",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        match cli.cmd {
            Cmd::Check { kind, files } => {
                assert_eq!(kind, ManifestType::Pcd);
                assert_eq!(files.len(), 2);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let res = Cli::try_parse_from(["manifestctl", "parse", "--kind", "recovery", "x.xml"]);
        assert!(res.is_err());
        let res = Cli::try_parse_from(["manifestctl", "check", "--kind", "cfm"]);
        assert!(res.is_err());
    }
}
