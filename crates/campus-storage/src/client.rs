//! URL-level storage client used by the inline media lifecycle.
//!
//! The lifecycle service addresses objects by their public URL. This client
//! resolves managed URLs to storage keys, treats already-absent objects as
//! deleted, and applies the missing-backend policy: a physical delete without
//! a configured backend is a hard error in production and a no-op elsewhere.

use campus_core::{AppError, InlineMediaConfig, ManagedUrlClassifier};
use std::sync::Arc;
use uuid::Uuid;

use crate::traits::{Storage, StorageError};

/// Object written by [`MediaStorageClient::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub key: String,
    pub url: String,
}

#[derive(Clone)]
pub struct MediaStorageClient {
    storage: Option<Arc<dyn Storage>>,
    classifier: ManagedUrlClassifier,
    production: bool,
}

impl MediaStorageClient {
    pub fn new(storage: Option<Arc<dyn Storage>>, config: &InlineMediaConfig) -> Self {
        Self {
            storage,
            classifier: ManagedUrlClassifier::from_config(config),
            production: config.is_production(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.storage.is_some()
    }

    pub fn classifier(&self) -> &ManagedUrlClassifier {
        &self.classifier
    }

    /// Upload an inline image under `inline-media/{kind}/{tenant_id}/{filename}`.
    pub async fn upload(
        &self,
        kind: &str,
        tenant_id: Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadedObject, AppError> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            AppError::StorageUnavailable("No storage backend configured for uploads".to_string())
        })?;

        let (key, url) = storage
            .upload(tenant_id, kind, filename, content_type, data)
            .await
            .map_err(|e| match e {
                StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
                other => AppError::StorageUploadFailed(other.to_string()),
            })?;

        Ok(UploadedObject { key, url })
    }

    /// Physically delete the object behind a managed URL.
    ///
    /// Safe to call for objects that are already gone.
    pub async fn delete(&self, url: &str) -> Result<(), AppError> {
        let Some(storage) = self.storage.as_ref() else {
            if self.production {
                return Err(AppError::StorageUnavailable(format!(
                    "No storage backend configured; cannot delete {}",
                    url
                )));
            }
            tracing::debug!(url = %url, "No storage backend configured, skipping physical delete");
            return Ok(());
        };

        let key = self
            .classifier
            .storage_key(url)
            .ok_or_else(|| AppError::StorageDeleteFailed {
                url: url.to_string(),
                message: "URL does not resolve to a storage key".to_string(),
            })?;

        match storage.delete(&key).await {
            Ok(()) | Err(StorageError::NotFound(_)) => Ok(()),
            Err(e) => Err(AppError::StorageDeleteFailed {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
