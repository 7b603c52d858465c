//! Static-site file-tree transformer.
//!
//! Loads a source directory, runs one build pass driven by `looper.toml`
//! rules, and prints the resulting rendering manifest.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use looper::core::error::LoopError;
use looper::core::registry::FileSet;
use looper::exit_codes;
use looper::io::config::{LooperConfig, load_config};
use looper::io::discover::load_dir;
use looper::io::manifest::{manifest_string, write_manifest};
use looper::pass::{PassSummary, run_pass};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "looper",
    version,
    about = "In-memory file-tree transformation for static-site builds"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a build pass and write the rendering manifest.
    Build {
        /// Source directory.
        src: PathBuf,
        /// Rules file.
        #[arg(short, long, default_value = "looper.toml")]
        config: PathBuf,
        /// Manifest destination; stdout when omitted.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Run a build pass and report rule violations only.
    Check {
        /// Source directory.
        src: PathBuf,
        /// Rules file.
        #[arg(short, long, default_value = "looper.toml")]
        config: PathBuf,
    },
}

fn main() {
    looper::logging::init();
    let code = match run() {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            if err.downcast_ref::<LoopError>().is_some() {
                exit_codes::CONTENT_ERROR
            } else {
                exit_codes::FAILED
            }
        }
    };
    process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Build { src, config, out } => cmd_build(&src, &config, out.as_deref()),
        Command::Check { src, config } => cmd_check(&src, &config),
    }
}

fn cmd_build(src: &Path, config_path: &Path, out: Option<&Path>) -> Result<()> {
    let (files, summary) = build(src, config_path)?;
    match out {
        Some(path) => {
            write_manifest(path, &files)?;
            info!(out = %path.display(), records = summary.records, "manifest written");
        }
        None => print!("{}", manifest_string(&files)?),
    }
    Ok(())
}

fn cmd_check(src: &Path, config_path: &Path) -> Result<()> {
    let (_, summary) = build(src, config_path)?;
    println!(
        "ok: {} records ({} content), {} indexes",
        summary.records, summary.content, summary.indexes
    );
    Ok(())
}

fn build(src: &Path, config_path: &Path) -> Result<(FileSet, PassSummary)> {
    let config: LooperConfig = load_config(config_path)?;
    let plugin = config.plugin();
    let mut files = load_dir(src)?;
    let summary = run_pass(&mut files, &config.pass, |actions| plugin.apply(actions), |_| {})
        .map_err(anyhow::Error::from)
        .with_context(|| format!("build {}", src.display()))?;
    Ok((files, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_build_defaults() {
        let cli = Cli::parse_from(["looper", "build", "site"]);
        match cli.command {
            Command::Build { src, config, out } => {
                assert_eq!(src, PathBuf::from("site"));
                assert_eq!(config, PathBuf::from("looper.toml"));
                assert!(out.is_none());
            }
            Command::Check { .. } => panic!("expected build"),
        }
    }

    #[test]
    fn parse_check_with_config() {
        let cli = Cli::parse_from(["looper", "check", "site", "--config", "rules.toml"]);
        assert!(matches!(
            cli.command,
            Command::Check { ref config, .. } if config == &PathBuf::from("rules.toml")
        ));
    }
}
