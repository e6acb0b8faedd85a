//! # Credential Rotator
//!
//! Keeps a single active key per service account and mints a fresh one on
//! every provisioning pass.

use super::error::ProvisionError;
use super::pipeline::Stage;
use crate::observability::metrics;
use crate::provider::{CloudGateway, ServiceAccountKey};
use tracing::{debug, info, warn};

/// Delete every key of `email` when it has more than one
///
/// A single key is left alone: a fresh service account already carries a
/// system-managed key. Individual delete failures are logged; the re-list
/// afterwards decides whether cleanup succeeded.
///
/// # Errors
/// `KeyCleanupIncomplete` when more than one key survives, or the provider
/// error of a list call
pub async fn delete_service_account_keys(
    gateway: &dyn CloudGateway,
    email: &str,
) -> Result<(), ProvisionError> {
    let keys = list_keys(gateway, email).await?;
    if keys.len() <= 1 {
        debug!("{} has {} key(s), nothing to clean up", email, keys.len());
        return Ok(());
    }

    info!("Deleting {} keys of {}", keys.len(), email);
    for key in &keys {
        if let Err(e) = gateway.delete_service_account_key(&key.name).await {
            warn!("Failed to delete key {}: {}", key.name, e);
        }
    }

    let remaining = list_keys(gateway, email).await?.len();
    if remaining > 1 {
        return Err(ProvisionError::KeyCleanupIncomplete {
            email: email.to_string(),
            remaining,
        });
    }
    Ok(())
}

/// Clean up old keys of `email`, then create and return a new one
///
/// # Errors
/// Any cleanup error, or the provider error of the create call
pub async fn rotate(
    gateway: &dyn CloudGateway,
    email: &str,
) -> Result<ServiceAccountKey, ProvisionError> {
    delete_service_account_keys(gateway, email).await?;

    let key = gateway
        .create_service_account_key(email)
        .await
        .map_err(|e| {
            ProvisionError::provider(
                Stage::RotateCredential,
                format!("create_service_account_key email={email}"),
                e,
            )
        })?;
    metrics::increment_service_account_keys_rotated();

    info!("Created key {} for {}", key.name, email);
    Ok(key)
}

async fn list_keys(
    gateway: &dyn CloudGateway,
    email: &str,
) -> Result<Vec<ServiceAccountKey>, ProvisionError> {
    gateway
        .list_service_account_keys(email)
        .await
        .map_err(|e| {
            ProvisionError::provider(
                Stage::RotateCredential,
                format!("list_service_account_keys email={email}"),
                e,
            )
        })
}
