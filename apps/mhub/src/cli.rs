//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use mhub_types::{ArtifactType, BuildStatus, ColorChoice};
use std::path::PathBuf;

/// mhub - build catalog and package repositories for monitoring exporters
#[derive(Parser)]
#[command(name = "mhub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build catalog and package repository tooling for monitoring exporters")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format (logs become JSON lines)
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Record the outcome of one build job as an artifact fact
    Fact(FactArgs),

    /// Merge an exporter's facts into its metadata.json rollup
    Aggregate {
        /// Exporter name
        #[arg(long)]
        exporter: String,

        /// Root of the fact store
        #[arg(long, value_name = "PATH")]
        catalog_dir: Option<PathBuf>,

        /// Manifest supplying version, category and description
        #[arg(long, value_name = "PATH")]
        manifest_path: Option<PathBuf>,

        /// Write the rollup here instead of the exporter's metadata.json
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Write the catalog index, per-exporter rollups and the legacy catalog
    Publish {
        #[arg(long, value_name = "PATH")]
        exporters_dir: Option<PathBuf>,

        #[arg(long, value_name = "PATH")]
        catalog_dir: Option<PathBuf>,

        #[arg(long, value_name = "PATH")]
        output_dir: Option<PathBuf>,
    },

    /// Decide which exporters need a rebuild
    Reconcile {
        /// Published catalog to compare against
        #[arg(long, value_name = "URL")]
        catalog_url: Option<String>,

        /// Select every exporter regardless of version
        #[arg(long)]
        force: bool,

        /// Only consider this exporter
        #[arg(long, value_name = "NAME")]
        exporter: Option<String>,

        #[arg(long, value_name = "PATH")]
        exporters_dir: Option<PathBuf>,
    },

    /// Regenerate package repository metadata from the full release history
    #[command(subcommand)]
    Scan(ScanCommands),

    /// Compare manifest versions with the latest upstream releases
    Watch {
        /// Rewrite manifests that are behind to the latest tag
        #[arg(long)]
        update: bool,

        #[arg(long, value_name = "PATH")]
        exporters_dir: Option<PathBuf>,

        /// GitHub API base URL
        #[arg(long, value_name = "URL")]
        api_base: Option<String>,
    },
}

#[derive(Args)]
pub struct FactArgs {
    /// Artifact type
    #[arg(long = "type", value_enum)]
    pub artifact_type: ArtifactType,

    /// Exporter name
    #[arg(long)]
    pub exporter: String,

    /// Exporter version; a leading `v` is dropped
    #[arg(long)]
    pub version: String,

    /// Build outcome
    #[arg(long, value_enum, default_value_t = BuildStatus::Success)]
    pub status: BuildStatus,

    /// Target architecture (rpm, deb)
    #[arg(long)]
    pub arch: Option<String>,

    /// Target distribution (rpm, deb)
    #[arg(long)]
    pub dist: Option<String>,

    /// Package file name (rpm, deb)
    #[arg(long)]
    pub filename: Option<String>,

    /// Package download URL (rpm, deb)
    #[arg(long)]
    pub url: Option<String>,

    /// Package SHA-256 (rpm, deb)
    #[arg(long)]
    pub sha256: Option<String>,

    /// Package size in bytes (rpm, deb)
    #[arg(long)]
    pub size: Option<u64>,

    /// JSON array of image descriptors (docker)
    #[arg(long, value_name = "JSON")]
    pub docker_images: Option<String>,

    /// Download the package and embed its own header fields
    #[arg(long)]
    pub extract_metadata: bool,

    /// Package download cache
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Write here instead of the canonical path in the fact store
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ScanCommands {
    /// YUM metadata for one distribution and architecture
    Yum(ScanArgs),
    /// APT metadata for one distribution and architecture
    Apt(ScanArgs),
}

#[derive(Args)]
pub struct ScanArgs {
    /// Distribution, e.g. `el9` or `debian-12`
    #[arg(long)]
    pub dist: String,

    /// Architecture (`amd64` is mapped to `x86_64` for yum)
    #[arg(long)]
    pub arch: String,

    /// Repository root to write metadata under
    #[arg(long, value_name = "PATH")]
    pub output_dir: PathBuf,

    /// Packages of the current build not yet released
    #[arg(long, value_name = "PATH")]
    pub new_builds_dir: Option<PathBuf>,

    /// Release repository as `owner/name`
    #[arg(long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Package download cache
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,
}

impl ScanCommands {
    pub fn args(&self) -> &ScanArgs {
        match self {
            Self::Yum(args) | Self::Apt(args) => args,
        }
    }
}
