//! Rebuild selection
//!
//! An exporter is rebuilt when it is missing from the published catalog, when
//! its local version differs from the published one, or when a rebuild is
//! forced. Versions are compared as plain strings, so a rollback to an older
//! version is selected just like an upgrade.

use mhub_index::PublishedCatalog;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    pub force: bool,
    /// Only consider this exporter
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Reason {
    New,
    VersionChanged { from: String, to: String },
    Forced,
    UpToDate,
}

impl Reason {
    #[must_use]
    pub fn needs_build(&self) -> bool {
        !matches!(self, Self::UpToDate)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("new"),
            Self::VersionChanged { from, to } => write!(f, "version update {from} -> {to}"),
            Self::Forced => f.write_str("forced"),
            Self::UpToDate => f.write_str("up to date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub name: String,
    pub local_version: String,
    pub published_version: Option<String>,
    #[serde(flatten)]
    pub reason: Reason,
}

/// Decisions for every considered exporter, in name order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildPlan {
    pub decisions: Vec<Decision>,
}

impl BuildPlan {
    /// Names selected for rebuild
    #[must_use]
    pub fn selected(&self) -> Vec<String> {
        self.decisions
            .iter()
            .filter(|d| d.reason.needs_build())
            .map(|d| d.name.clone())
            .collect()
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.decisions.len() - self.selected().len()
    }

    #[must_use]
    pub fn build_needed(&self) -> bool {
        self.decisions.iter().any(|d| d.reason.needs_build())
    }
}

/// Decide what to rebuild from local and published versions
#[must_use]
pub fn reconcile(
    local: &BTreeMap<String, String>,
    published: &PublishedCatalog,
    options: &ReconcileOptions,
) -> BuildPlan {
    let decisions = local
        .iter()
        .filter(|(name, _)| options.target.as_deref().is_none_or(|t| t == name.as_str()))
        .map(|(name, local_version)| {
            let published_version = published.version_of(name).map(ToString::to_string);
            let reason = match published_version.as_deref() {
                _ if options.force => Reason::Forced,
                None => Reason::New,
                Some(remote) if remote != local_version => Reason::VersionChanged {
                    from: remote.to_string(),
                    to: local_version.clone(),
                },
                Some(_) => Reason::UpToDate,
            };

            if reason.needs_build() {
                tracing::info!(exporter = %name, local = %local_version, reason = %reason, "build");
            } else {
                tracing::info!(exporter = %name, local = %local_version, "skip: up to date");
            }

            Decision {
                name: name.clone(),
                local_version: local_version.clone(),
                published_version,
                reason,
            }
        })
        .collect();

    BuildPlan { decisions }
}
