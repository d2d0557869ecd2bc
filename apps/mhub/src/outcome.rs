//! What each command reports back

use mhub_index::{AggregateOutcome, PublishReport};
use mhub_repository::{ScanOutcome, WriteOutcome};
use mhub_state::{Decision, ReconcileReport, WatchCheck, WatchReport};
use mhub_store::ArtifactFact;
use mhub_types::{AggregateStatus, ArtifactType, BuildStatus};
use serde::Serialize;
use std::path::PathBuf;

/// Result of one command, rendered as a table or as JSON
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandOutcome {
    Fact(FactSummary),
    Aggregate(AggregateSummary),
    Publish(PublishSummary),
    Reconcile(ReconcileSummary),
    Scan(ScanSummary),
    Watch(WatchSummary),
}

impl CommandOutcome {
    /// Serialize for `--json` output
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A unit of a batch command that did not make it, and why
#[derive(Debug, Serialize)]
pub struct FailedUnit {
    pub unit: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct FactSummary {
    pub path: PathBuf,
    pub exporter: String,
    pub artifact_type: ArtifactType,
    pub target: Option<String>,
    pub status: BuildStatus,
    pub metadata_embedded: bool,
}

impl FactSummary {
    pub fn new(fact: &ArtifactFact, path: PathBuf) -> Self {
        let target = match (&fact.dist, &fact.arch) {
            (Some(dist), Some(arch)) => Some(format!("{dist}/{arch}")),
            _ => None,
        };
        Self {
            path,
            exporter: fact.exporter.clone(),
            artifact_type: fact.artifact_type,
            target,
            status: fact.status,
            metadata_embedded: fact.rpm_metadata.is_some() || fact.deb_metadata.is_some(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AggregateSummary {
    pub exporter: String,
    pub version: String,
    pub path: PathBuf,
    pub facts: usize,
    pub skipped: usize,
    pub rpm: AggregateStatus,
    pub deb: AggregateStatus,
    pub docker: AggregateStatus,
}

impl AggregateSummary {
    pub fn new(outcome: &AggregateOutcome, path: PathBuf) -> Self {
        let rollup = &outcome.rollup;
        Self {
            exporter: rollup.exporter.clone(),
            version: rollup.version.clone(),
            path,
            facts: outcome.facts,
            skipped: outcome.skipped,
            rpm: rollup.status.rpm,
            deb: rollup.status.deb,
            docker: rollup.status.docker,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublishSummary {
    pub published: Vec<String>,
    pub aggregated: usize,
    pub manifest_only: usize,
    pub failed: Vec<FailedUnit>,
    pub index_path: PathBuf,
    pub legacy_path: PathBuf,
}

impl From<PublishReport> for PublishSummary {
    fn from(report: PublishReport) -> Self {
        Self {
            published: report.published,
            aggregated: report.aggregated,
            manifest_only: report.manifest_only,
            failed: report
                .failed
                .into_iter()
                .map(|(path, reason)| FailedUnit {
                    unit: path.display().to_string(),
                    reason,
                })
                .collect(),
            index_path: report.index_path,
            legacy_path: report.legacy_path,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReconcileSummary {
    pub selected: Vec<String>,
    pub decisions: Vec<Decision>,
    pub published: usize,
    pub invalid: usize,
    /// Where the CI output lines went, if anywhere
    pub github_output: Option<PathBuf>,
}

impl ReconcileSummary {
    pub fn new(report: ReconcileReport, github_output: Option<PathBuf>) -> Self {
        Self {
            selected: report.plan.selected(),
            decisions: report.plan.decisions,
            published: report.published,
            invalid: report.invalid,
            github_output,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PackageLine {
    pub name: String,
    pub version: String,
    pub arch: String,
}

#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub kind: ArtifactType,
    pub dist: String,
    pub arch: String,
    pub packages: Vec<PackageLine>,
    pub from_history: usize,
    pub from_new_builds: usize,
    pub history_unavailable: bool,
    pub failed: Vec<FailedUnit>,
    pub written: WriteOutcome,
}

impl ScanSummary {
    pub fn new(
        kind: ArtifactType,
        dist: &str,
        arch: &str,
        outcome: ScanOutcome,
        written: WriteOutcome,
    ) -> Self {
        Self {
            kind,
            dist: dist.to_string(),
            arch: arch.to_string(),
            packages: outcome
                .packages
                .iter()
                .map(|p| PackageLine {
                    name: p.name.clone(),
                    version: if p.release.is_empty() {
                        p.version.clone()
                    } else {
                        format!("{}-{}", p.version, p.release)
                    },
                    arch: p.arch.clone(),
                })
                .collect(),
            from_history: outcome.from_history,
            from_new_builds: outcome.from_new_builds,
            history_unavailable: outcome.history_unavailable,
            failed: outcome
                .failed
                .into_iter()
                .map(|(unit, reason)| FailedUnit { unit, reason })
                .collect(),
            written,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WatchSummary {
    pub checks: Vec<WatchCheck>,
    pub updated: Vec<String>,
    pub available: Vec<String>,
    pub skipped: Vec<String>,
    pub invalid: usize,
    pub github_output: Option<PathBuf>,
}

impl WatchSummary {
    pub fn new(report: WatchReport, github_output: Option<PathBuf>) -> Self {
        Self {
            updated: report.updated(),
            available: report.available(),
            checks: report.checks,
            skipped: report.skipped,
            invalid: report.invalid,
            github_output,
        }
    }
}
