//! mhub - build catalog and package repository tooling for monitoring exporters
//!
//! Each subcommand is one step of the CI pipeline: build jobs record facts,
//! the aggregate and publish steps turn them into catalog files, the
//! reconciler picks what the next cycle rebuilds, the scan commands
//! regenerate the YUM and APT repositories, and the watcher bumps manifests
//! when upstream releases something new.

mod cli;
mod commands;
mod display;
mod error;
mod logging;
mod outcome;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::outcome::CommandOutcome;
use clap::Parser;
use mhub_config::Config;
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.global.json, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!(version = env!("CARGO_PKG_VERSION"), "starting mhub");

    // defaults < file < environment < flags
    let mut config = Config::load_or_default(cli.global.config.as_deref())
        .await
        .map_err(CliError::Config)?;
    config.merge_env().map_err(CliError::Config)?;
    apply_cli_config(&mut config, &cli.global, &cli.command);

    let renderer = OutputRenderer::new(cli.global.json, config.general.color);

    let result = execute_command(cli.command, &config).await?;
    renderer.render_result(&result)?;

    info!("command completed");
    Ok(())
}

/// Execute the specified command
async fn execute_command(command: Commands, config: &Config) -> Result<CommandOutcome, CliError> {
    match command {
        Commands::Fact(args) => commands::fact(config, args).await,
        Commands::Aggregate {
            exporter,
            manifest_path,
            output,
            ..
        } => commands::aggregate(config, &exporter, manifest_path, output).await,
        Commands::Publish { .. } => commands::publish(config).await,
        Commands::Reconcile { .. } => commands::reconcile(config).await,
        Commands::Scan(scan) => commands::scan(config, scan).await,
        Commands::Watch { update, .. } => commands::watch(config, update).await,
    }
}

/// Fold command line flags into the configuration; they win over everything
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    let paths = &mut config.paths;
    match command {
        Commands::Fact(args) => {
            if let Some(dir) = &args.cache_dir {
                paths.cache_dir = Some(dir.clone());
            }
        }
        Commands::Aggregate { catalog_dir, .. } => {
            if let Some(dir) = catalog_dir {
                paths.catalog_dir = Some(dir.clone());
            }
        }
        Commands::Publish {
            exporters_dir,
            catalog_dir,
            output_dir,
        } => {
            if let Some(dir) = exporters_dir {
                paths.exporters_dir = Some(dir.clone());
            }
            if let Some(dir) = catalog_dir {
                paths.catalog_dir = Some(dir.clone());
            }
            if let Some(dir) = output_dir {
                paths.output_dir = Some(dir.clone());
            }
        }
        Commands::Reconcile {
            catalog_url,
            force,
            exporter,
            exporters_dir,
        } => {
            if let Some(url) = catalog_url {
                config.catalog.url.clone_from(url);
            }
            if *force {
                config.catalog.force_rebuild = true;
            }
            if let Some(name) = exporter {
                config.catalog.target_exporter = Some(name.clone());
            }
            if let Some(dir) = exporters_dir {
                paths.exporters_dir = Some(dir.clone());
            }
        }
        Commands::Scan(scan) => {
            let args = scan.args();
            if let Some(dir) = &args.cache_dir {
                paths.cache_dir = Some(dir.clone());
            }
            if let Some(repo) = &args.repo {
                config.repository.github_repo.clone_from(repo);
            }
        }
        Commands::Watch {
            exporters_dir,
            api_base,
            ..
        } => {
            if let Some(dir) = exporters_dir {
                paths.exporters_dir = Some(dir.clone());
            }
            if let Some(url) = api_base {
                config.repository.api_base.clone_from(url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mhub").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&[
            "reconcile",
            "--catalog-url",
            "http://localhost/catalog.json",
            "--force",
            "--exporter",
            "node_exporter",
        ]);
        let mut config = Config::default();
        apply_cli_config(&mut config, &cli.global, &cli.command);

        assert_eq!(config.catalog.url, "http://localhost/catalog.json");
        assert!(config.catalog.force_rebuild);
        assert_eq!(config.catalog.target_exporter.as_deref(), Some("node_exporter"));
    }

    #[test]
    fn test_scan_repo_flag() {
        let cli = parse(&[
            "--color",
            "never",
            "scan",
            "apt",
            "--dist",
            "debian-12",
            "--arch",
            "amd64",
            "--output-dir",
            "out",
            "--repo",
            "acme/hub",
        ]);
        let mut config = Config::default();
        apply_cli_config(&mut config, &cli.global, &cli.command);

        assert_eq!(config.repository.github_repo, "acme/hub");
        assert_eq!(config.general.color, mhub_types::ColorChoice::Never);
    }

    #[test]
    fn test_watch_flags() {
        let cli = parse(&[
            "watch",
            "--update",
            "--exporters-dir",
            "exp",
            "--api-base",
            "http://localhost:8080",
        ]);
        let mut config = Config::default();
        apply_cli_config(&mut config, &cli.global, &cli.command);

        assert!(matches!(cli.command, Commands::Watch { update: true, .. }));
        assert_eq!(config.exporters_dir(), std::path::PathBuf::from("exp"));
        assert_eq!(config.repository.api_base, "http://localhost:8080");
    }
}
