use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::source::Feature;

/// Failure of one (source, feature) call.
///
/// These are expected vendor failure modes, carried as values in
/// `failed_features` rather than propagated as panics. String payloads keep
/// the type `Clone` + serializable so failures can travel with the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderError {
    /// Missing or invalid credentials; surfaced distinctly so the caller can
    /// prompt for them, never retried automatically.
    #[error("no API key configured for source '{source_id}'")]
    MissingApiKey { source_id: String },

    /// HTTP 401/403.
    #[error("request rejected by vendor (HTTP {status})")]
    Unauthorized { status: u16 },

    /// HTTP 409/429-class; caller may back off.
    #[error("vendor rate limit hit (HTTP {status})")]
    RateLimited { status: u16 },

    /// Timeout, DNS, connection reset. Eligible for caller-driven retry.
    #[error("network failure: {message}")]
    Network { message: String },

    #[error("request timed out")]
    Timeout,

    /// The location is outside this vendor's coverage. Permanent for this
    /// (source, location) pair.
    #[error("location not covered by source '{source_id}'")]
    OutOfCoverage { source_id: String },

    /// Location-parameter resolution has not produced the artifacts this
    /// vendor requires (e.g. a grid cell id).
    #[error("source '{source_id}' is missing resolved location parameters")]
    MissingLocationParameters { source_id: String },

    /// Empty or structurally incomplete vendor response; the converter
    /// refuses to fabricate an aggregate from it.
    #[error("vendor returned stale or invalid data: {message}")]
    InvalidData { message: String },

    /// Unexpected non-success status not covered by a more specific kind.
    #[error("vendor request failed (HTTP {status}): {body}")]
    HttpStatus { status: u16, body: String },

    /// Structurally required field failed to parse.
    #[error("failed to parse vendor response: {message}")]
    Parse { message: String },

    /// No registered source can serve this feature at this location.
    #[error("no eligible source for this feature at this location")]
    NoEligibleSource,
}

impl ProviderError {
    /// True for failures a caller may reasonably retry later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout | Self::RateLimited { .. }
        )
    }

    pub fn network(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }

    pub fn parse(err: impl std::fmt::Display) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

/// Failure of a whole refresh request.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// Every requested feature failed; the caller should fall back to its
    /// previously cached aggregate.
    #[error("all requested features failed")]
    AllFeaturesFailed(BTreeMap<Feature, ProviderError>),

    /// No registered source supports any of the requested features here.
    #[error("no source available for the requested features at this location")]
    NoEligibleSource,
}
