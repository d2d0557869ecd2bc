//! Exporter manifest error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ManifestError {
    #[error("manifest not found: {path}")]
    NotFound { path: String },

    #[error("failed to parse manifest {path}: {message}")]
    Parse { path: String, message: String },

    #[error("manifest {path} is missing required field: {field}")]
    MissingField { path: String, field: String },
}

impl UserFacingError for ManifestError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Each exporter needs exporters/<name>/manifest.yaml."),
            Self::Parse { .. } | Self::MissingField { .. } => {
                Some("Fix the manifest YAML; other exporters are processed regardless.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "manifest.not_found",
            Self::Parse { .. } => "manifest.parse_error",
            Self::MissingField { .. } => "manifest.missing_field",
        };
        Some(code)
    }
}
