//! Command implementations

use crate::cli::{FactArgs, ScanCommands};
use crate::error::CliError;
use crate::outcome::{
    AggregateSummary, CommandOutcome, FactSummary, ReconcileSummary, ScanSummary, WatchSummary,
};
use mhub_config::Config;
use mhub_errors::{Error, ManifestError};
use mhub_index::{aggregate_exporter, write_rollup, PublishOptions};
use mhub_net::{GitHubApi, GitHubReleases, NetClient, NetConfig};
use mhub_repository::{
    resolve_codename, scan as scan_assets, write_apt_repo, write_yum_repo, AssetFilter,
    CommandInspector, PackageCache,
};
use mhub_state::{
    append_github_output, append_updated_names, reconcile_from, ReconcileOptions, WatchOptions,
};
use mhub_store::{attach_package_metadata, generate_fact, FactRequest, FactStore};
use mhub_types::{ArtifactType, Manifest, MANIFEST_FILE};
use std::path::PathBuf;
use tracing::{info, warn};

/// CI output file; set by GitHub Actions for every step
const GITHUB_OUTPUT_VAR: &str = "GITHUB_OUTPUT";

fn client(config: &Config) -> Result<NetClient, CliError> {
    Ok(NetClient::new(NetConfig::from(&config.network))?)
}

fn github_output() -> Option<PathBuf> {
    std::env::var_os(GITHUB_OUTPUT_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

pub async fn fact(config: &Config, args: FactArgs) -> Result<CommandOutcome, CliError> {
    let request = FactRequest {
        artifact_type: Some(args.artifact_type),
        exporter: args.exporter,
        version: args.version,
        status: args.status,
        arch: args.arch,
        dist: args.dist,
        filename: args.filename,
        url: args.url,
        sha256: args.sha256,
        size: args.size,
        docker_images: args.docker_images,
    };
    let mut fact = generate_fact(&request)?;

    if args.extract_metadata {
        match fact.package.as_ref().map(|p| p.url.clone()) {
            Some(url) => {
                let cache = PackageCache::new(client(config)?, config.cache_dir(), CommandInspector);
                match cache.metadata(&url, fact.artifact_type).await {
                    Ok(metadata) => attach_package_metadata(&mut fact, metadata),
                    Err(e) => warn!(url = %url, error = %e, "package metadata extraction failed"),
                }
            }
            None => warn!("--extract-metadata ignored for container images"),
        }
    }

    let store = FactStore::new(config.catalog_dir());
    let path = store.write(&fact, args.output.as_deref()).await?;
    Ok(CommandOutcome::Fact(FactSummary::new(&fact, path)))
}

pub async fn aggregate(
    config: &Config,
    exporter: &str,
    manifest_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<CommandOutcome, CliError> {
    // A missing manifest falls back to the rollup defaults; an explicit path
    // that exists but does not parse is still an error.
    let explicit = manifest_path.is_some();
    let path = manifest_path
        .unwrap_or_else(|| config.exporters_dir().join(exporter).join(MANIFEST_FILE));
    let manifest = match Manifest::load(&path).await {
        Ok(manifest) => Some(manifest),
        Err(Error::Manifest(ManifestError::NotFound { .. })) => {
            warn!(path = %path.display(), "manifest not found, using defaults");
            None
        }
        Err(e) if explicit => return Err(e.into()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable manifest");
            None
        }
    };

    let store = FactStore::new(config.catalog_dir());
    let outcome = aggregate_exporter(&store, exporter, manifest.as_ref()).await?;
    let path = write_rollup(&store, &outcome.rollup, output.as_deref()).await?;
    Ok(CommandOutcome::Aggregate(AggregateSummary::new(&outcome, path)))
}

pub async fn publish(config: &Config) -> Result<CommandOutcome, CliError> {
    let options = PublishOptions {
        exporters_dir: config.exporters_dir(),
        catalog_dir: config.catalog_dir(),
        output_dir: config.output_dir(),
        arch_map: config.repository.arch_map.clone(),
    };
    let report = mhub_index::publish(&options).await?;
    Ok(CommandOutcome::Publish(report.into()))
}

pub async fn reconcile(config: &Config) -> Result<CommandOutcome, CliError> {
    let options = ReconcileOptions {
        force: config.catalog.force_rebuild,
        target: config.catalog.target_exporter.clone(),
    };
    let report = reconcile_from(
        &client(config)?,
        &config.exporters_dir(),
        &config.catalog.url,
        &options,
    )
    .await?;

    for decision in &report.plan.decisions {
        info!(exporter = %decision.name, decision = %decision.reason, "reconciled");
    }

    let github_output = github_output();
    if let Some(path) = &github_output {
        append_github_output(path, &report.plan.selected()).await?;
    }

    Ok(CommandOutcome::Reconcile(ReconcileSummary::new(
        report,
        github_output,
    )))
}

pub async fn scan(config: &Config, command: ScanCommands) -> Result<CommandOutcome, CliError> {
    let client = client(config)?;
    let repo = &config.repository;
    let source = GitHubReleases::new(
        client.clone(),
        &repo.api_base,
        &repo.github_repo,
        repo.github_token.clone(),
    );
    let cache = PackageCache::new(client, config.cache_dir(), CommandInspector);

    match command {
        ScanCommands::Yum(args) => {
            if !repo.supported_distros.contains(&args.dist) {
                warn!(dist = %args.dist, "distribution not in the supported list");
            }
            let arch = config.rpm_arch(&args.arch).to_string();
            let filter = AssetFilter::rpm(&args.dist, &arch);
            let outcome =
                scan_assets(&source, &cache, &filter, args.new_builds_dir.as_deref()).await?;
            let written =
                write_yum_repo(&args.output_dir, &args.dist, &arch, &outcome.packages).await?;
            Ok(CommandOutcome::Scan(ScanSummary::new(
                ArtifactType::Rpm,
                &args.dist,
                &arch,
                outcome,
                written,
            )))
        }
        ScanCommands::Apt(args) => {
            let codename = resolve_codename(&repo.deb_codenames, &args.dist)?;
            let filter = AssetFilter::deb(&args.dist, &args.arch);
            let outcome =
                scan_assets(&source, &cache, &filter, args.new_builds_dir.as_deref()).await?;
            let written =
                write_apt_repo(&args.output_dir, codename, &args.arch, &outcome.packages).await?;
            Ok(CommandOutcome::Scan(ScanSummary::new(
                ArtifactType::Deb,
                &args.dist,
                &args.arch,
                outcome,
                written,
            )))
        }
    }
}

pub async fn watch(config: &Config, update: bool) -> Result<CommandOutcome, CliError> {
    let repo = &config.repository;
    let api = GitHubApi::new(client(config)?, &repo.api_base, repo.github_token.clone());
    let report = mhub_state::watch(&api, &config.exporters_dir(), &WatchOptions { update }).await?;

    // only a run that changed manifests has anything to hand to the PR step
    let updated = report.updated();
    let github_output = github_output().filter(|_| !updated.is_empty());
    if let Some(path) = &github_output {
        append_updated_names(path, &updated).await?;
    }

    Ok(CommandOutcome::Watch(WatchSummary::new(report, github_output)))
}
