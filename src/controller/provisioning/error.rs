//! # Provisioning Errors
//!
//! Failure taxonomy of a provisioning pass.

use super::pipeline::Stage;
use crate::provider::GatewayError;
use crate::store::SecretStoreError;
use thiserror::Error;

/// Terminal validation failures
///
/// The request must change before another pass can succeed, so these are
/// never retried on a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("spec.platform.gcp.projectID is empty")]
    MissingProjectId,
    #[error("spec.platform.gcp.region is empty")]
    MissingRegion,
    #[error("region is not supported")]
    RegionNotSupported,
    #[error("cluster platform is not gcp")]
    NotThisPlatform,
    #[error("cluster is not managed")]
    NotManaged,
}

impl ValidationError {
    /// Not-ours rejections: the object belongs to another platform or is unmanaged
    #[must_use]
    pub fn is_foreign(self) -> bool {
        matches!(self, Self::NotThisPlatform | Self::NotManaged)
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("credentials secret {namespace}/{name} unavailable: {reason}")]
    CredentialUnavailable {
        namespace: String,
        name: String,
        reason: String,
    },

    #[error("{stage} failed ({operands}): {source}")]
    ProviderCall {
        stage: Stage,
        operands: String,
        #[source]
        source: GatewayError,
    },

    #[error("could not delete all keys of {email}: {remaining} remain")]
    KeyCleanupIncomplete { email: String, remaining: usize },

    #[error("failed to {operation} secret {namespace}/{name}: {source}")]
    SecretStore {
        operation: &'static str,
        namespace: String,
        name: String,
        #[source]
        source: SecretStoreError,
    },

    #[error("invalid service account key material: {0}")]
    KeyDecode(String),

    #[error("stage {stage} ran without the output of an earlier stage")]
    StageOrder { stage: Stage },
}

impl ProvisionError {
    pub(crate) fn provider(stage: Stage, operands: impl Into<String>, source: GatewayError) -> Self {
        Self::ProviderCall {
            stage,
            operands: operands.into(),
            source,
        }
    }

    pub(crate) fn secret_store(
        operation: &'static str,
        namespace: &str,
        name: &str,
        source: SecretStoreError,
    ) -> Self {
        Self::SecretStore {
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        }
    }

    /// Whether re-running the pass may succeed without the request changing
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }

    /// Short label for metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::CredentialUnavailable { .. } => "credential_unavailable",
            Self::ProviderCall { .. } => "provider_call",
            Self::KeyCleanupIncomplete { .. } => "key_cleanup_incomplete",
            Self::SecretStore { .. } => "secret_store",
            Self::KeyDecode(_) => "key_decode",
            Self::StageOrder { .. } => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_terminal() {
        let err = ProvisionError::from(ValidationError::MissingRegion);
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_provider_call_names_stage_and_operands() {
        let err = ProvisionError::provider(
            Stage::EnsureProject,
            "parent_folder_id=240634451310",
            GatewayError::Auth("expired".to_string()),
        );
        assert!(err.is_retryable());
        let message = err.to_string();
        assert!(message.starts_with("ensure_project failed (parent_folder_id=240634451310)"));
    }

    #[test]
    fn test_foreign_rejections() {
        assert!(ValidationError::NotThisPlatform.is_foreign());
        assert!(ValidationError::NotManaged.is_foreign());
        assert!(!ValidationError::MissingProjectId.is_foreign());
    }
}
