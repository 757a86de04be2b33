//! Registry integrity check run before any mutation

use tracing::error;

use crate::ports::IDeviceRegistry;

use super::errors::AuditError;

/// Fails when the registry holds more than one record under a name
///
/// # Errors
/// [`AuditError::DuplicateNames`] listing the offending names, or
/// [`AuditError::Store`] if the check itself fails
pub async fn assert_no_duplicate_names(registry: &dyn IDeviceRegistry) -> Result<(), AuditError> {
    let duplicates = registry
        .duplicate_names()
        .await
        .map_err(|e| AuditError::Store(e.context("Failed to check registry for duplicate names")))?;

    if duplicates.is_empty() {
        return Ok(());
    }

    for name in &duplicates {
        error!(device = %name, "Device name appears more than once in the registry");
    }
    Err(AuditError::DuplicateNames(duplicates))
}
