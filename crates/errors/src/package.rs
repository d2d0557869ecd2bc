//! Package inspection and repository metadata error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PackageError {
    #[error("failed to inspect {path}: {message}")]
    InspectFailed { path: String, message: String },

    #[error("inspection tool not available: {tool}")]
    ToolUnavailable { tool: String },

    #[error("invalid package format: {message}")]
    InvalidFormat { message: String },

    #[error("unknown distribution: {dist}")]
    UnknownDistribution { dist: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolUnavailable { .. } => {
                Some("Install the rpm and dpkg tooling on the machine running the scan.")
            }
            Self::UnknownDistribution { .. } => {
                Some("Add the distribution to [repository.deb_codenames] in the config file.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InspectFailed { .. } => "package.inspect_failed",
            Self::ToolUnavailable { .. } => "package.tool_unavailable",
            Self::InvalidFormat { .. } => "package.invalid_format",
            Self::UnknownDistribution { .. } => "package.unknown_distribution",
        };
        Some(code)
    }
}
