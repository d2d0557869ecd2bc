//! Catalog and rollup document error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("unsupported rollup format: {version}")]
    UnsupportedFormat { version: String },

    #[error("invalid catalog document: {message}")]
    InvalidDocument { message: String },

    #[error("exporter directory not found: {path}")]
    ExporterNotFound { path: String },
}

impl UserFacingError for CatalogError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedFormat { .. } => {
                Some("Re-run `mhub aggregate` to regenerate the rollup in the current format.")
            }
            Self::ExporterNotFound { .. } => {
                Some("No facts were written for this exporter yet; run the build jobs first.")
            }
            Self::InvalidDocument { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnsupportedFormat { .. } => "catalog.unsupported_format",
            Self::InvalidDocument { .. } => "catalog.invalid_document",
            Self::ExporterNotFound { .. } => "catalog.exporter_not_found",
        };
        Some(code)
    }
}
