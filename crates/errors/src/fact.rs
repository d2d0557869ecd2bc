//! Artifact fact error types
//!
//! These are invariant violations: a fact that cannot be written correctly
//! must not be written at all.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum FactError {
    #[error("missing required fields for {artifact_type}: {}", fields.join(", "))]
    MissingFields {
        artifact_type: String,
        fields: Vec<String>,
    },

    #[error("invalid {field} {value:?}: {reason}")]
    InvalidKey {
        field: String,
        value: String,
        reason: String,
    },

    #[error("invalid docker image list: {message}")]
    InvalidImages { message: String },

    #[error("refusing to overwrite {path}: it holds fact {existing}, not {requested}")]
    KeyConflict {
        path: String,
        existing: String,
        requested: String,
    },

    #[error("malformed fact {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("unsupported fact format version: {version}")]
    UnsupportedFormat { version: String },
}

impl UserFacingError for FactError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingFields { .. } => Some(
                "rpm/deb facts need --arch, --dist, --filename, --url, --sha256 and --size; docker facts need --docker-images.",
            ),
            Self::InvalidKey { .. } => Some(
                "Exporter, arch and dist become file names: no path separators or '..', and no '_' in dist.",
            ),
            Self::InvalidImages { .. } => {
                Some("Pass a JSON array such as '[{\"registry\":\"ghcr.io\",\"tag\":\"1.0.0\"}]'.")
            }
            Self::KeyConflict { .. } => {
                Some("Each build job must write its own file; check the --output path.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::MissingFields { .. } => "fact.missing_field",
            Self::InvalidKey { .. } => "fact.invalid_key",
            Self::InvalidImages { .. } => "fact.invalid_images",
            Self::KeyConflict { .. } => "fact.key_conflict",
            Self::Malformed { .. } => "fact.malformed",
            Self::UnsupportedFormat { .. } => "fact.unsupported_format",
        };
        Some(code)
    }
}
