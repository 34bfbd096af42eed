use campus_core::models::{
    EntityRef, InlineMediaAsset, InlineMediaScope, InlineMediaStatusCounts, NewTempAsset,
    UploadProvenance,
};
use campus_core::{
    AppError, ImgTagExtractor, InlineMediaConfig, InlineReferenceExtractor, ManagedUrlClassifier,
};
use campus_db::InlineMediaRepository;
use campus_storage::MediaStorageClient;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::clock::{SystemTimeProvider, TimeProvider};
use super::policy::PhysicalDeletion;
use super::types::{PurgeReport, RemoveEntityImages, RemoveReport, SyncEntityImages, SyncReport};

/// Coordinates the inline media registry with storage.
///
/// Stateless between calls. Every public operation except the summary first
/// runs a best-effort purge of expired TEMP uploads, so no scheduler is needed.
#[derive(Clone)]
pub struct InlineMediaLifecycleService {
    repository: Arc<dyn InlineMediaRepository>,
    storage: MediaStorageClient,
    extractor: Arc<dyn InlineReferenceExtractor>,
    classifier: ManagedUrlClassifier,
    config: InlineMediaConfig,
    clock: Arc<dyn TimeProvider>,
}

impl InlineMediaLifecycleService {
    /// Build the service from a config that passed [`InlineMediaConfig::validate`].
    pub fn new(
        repository: Arc<dyn InlineMediaRepository>,
        storage: MediaStorageClient,
        config: InlineMediaConfig,
    ) -> Self {
        let classifier = ManagedUrlClassifier::from_config(&config);
        Self {
            repository,
            storage,
            extractor: Arc::new(ImgTagExtractor::new(classifier.clone())),
            classifier,
            config,
            clock: Arc::new(SystemTimeProvider),
        }
    }

    /// Replace the reference extractor (e.g. a stricter markup parser).
    pub fn with_extractor(mut self, extractor: Arc<dyn InlineReferenceExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_time_provider(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &InlineMediaConfig {
        &self.config
    }

    /// Register an already-uploaded object as a TEMP asset.
    ///
    /// Re-registering a TEMP URL refreshes its expiry; a LINKED URL stays LINKED.
    /// Returns `None` without touching the registry when the URL is not managed,
    /// and `InvalidInput` when a managed URL has no usable storage key.
    #[tracing::instrument(skip(self))]
    pub async fn register_temp_upload(
        &self,
        tenant_id: Uuid,
        uploader_id: Uuid,
        scope: InlineMediaScope,
        url: &str,
    ) -> Result<Option<InlineMediaAsset>, AppError> {
        self.purge_best_effort().await;

        let url = url.trim();
        if !self.classifier.is_managed(url) {
            tracing::debug!(url = %url, "Ignoring unmanaged URL");
            return Ok(None);
        }
        if self.classifier.storage_key(url).is_none() {
            return Err(AppError::InvalidInput(format!(
                "Managed URL {} does not address a storage object",
                url
            )));
        }

        let expires_at = self
            .config
            .temp_ttl()
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "TEMP time-to-live of {} minutes is out of range",
                    self.config.temp_ttl_minutes
                ))
            })?;

        let new = NewTempAsset {
            url: url.to_string(),
            provenance: UploadProvenance {
                tenant_id,
                uploaded_by_user_id: uploader_id,
                scope,
            },
            expires_at,
        };

        let asset = self.repository.upsert_temp(&new).await?;
        if asset.is_linked() {
            tracing::warn!(
                url = %url,
                entity = ?asset.entity(),
                "URL is already linked, registration left it unchanged"
            );
            return Ok(Some(asset));
        }

        tracing::info!(
            url = %asset.url,
            tenant_id = %tenant_id,
            expires_at = ?asset.expires_at,
            "Registered inline media upload"
        );

        Ok(Some(asset))
    }

    /// Upload an inline image and register it as TEMP.
    #[tracing::instrument(skip(self, data), fields(size_bytes = data.len()))]
    pub async fn upload_inline_image(
        &self,
        tenant_id: Uuid,
        uploader_id: Uuid,
        scope: InlineMediaScope,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<InlineMediaAsset, AppError> {
        if !content_type.starts_with("image/") {
            return Err(AppError::InvalidInput(format!(
                "Inline media must be an image, got {}",
                content_type
            )));
        }
        if data.is_empty() {
            return Err(AppError::InvalidInput("Empty upload".to_string()));
        }

        let stored_name = stored_filename(filename);
        let object = self
            .storage
            .upload(
                scope.storage_segment(),
                tenant_id,
                &stored_name,
                content_type,
                data,
            )
            .await?;

        self.register_temp_upload(tenant_id, uploader_id, scope, &object.url)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Uploaded URL {} is not managed media; check PUBLIC_MEDIA_BASE_URL",
                    object.url
                ))
            })
    }

    /// Make the entity's LINKED set equal to the managed images of its new body.
    #[tracing::instrument(
        skip(self, params),
        fields(entity = %params.entity, scope = %params.scope)
    )]
    pub async fn sync_entity_images(
        &self,
        params: SyncEntityImages,
    ) -> Result<SyncReport, AppError> {
        self.purge_best_effort().await;

        let entity = params.entity;
        let policy = PhysicalDeletion::from_flag(params.delete_removed_physically);

        let next_urls = self.extractor.extract(&params.next_body_html);
        let mut previous_urls: HashSet<String> = self
            .repository
            .list_linked(&entity)
            .await?
            .into_iter()
            .map(|asset| asset.url)
            .collect();
        if let Some(body) = params.previous_body_html.as_deref() {
            previous_urls.extend(self.extractor.extract(body));
        }

        let mut removed_urls: Vec<String> =
            previous_urls.difference(&next_urls).cloned().collect();
        removed_urls.sort();
        let mut next_urls: Vec<String> = next_urls.into_iter().collect();
        next_urls.sort();

        let mut physically_deleted = 0;
        if policy.deletes_objects() {
            let candidates = self.owned_by(&entity, &removed_urls).await?;
            physically_deleted = self.delete_all_or_abort(&candidates).await?;
        }

        for url in &next_urls {
            if let Some(existing) = self.repository.get_by_url(url).await? {
                if let Some(owner) = existing.entity().filter(|owner| *owner != entity) {
                    tracing::warn!(
                        url = %url,
                        previous_owner = %owner,
                        new_owner = %entity,
                        "Re-binding inline image to another entity"
                    );
                }
            }
        }

        let outcome = self
            .repository
            .apply_entity_sync(&entity, &params.provenance(), &removed_urls, &next_urls)
            .await?;

        let report = SyncReport {
            linked: outcome.linked,
            removed: outcome.removed,
            physically_deleted,
        };

        tracing::info!(
            entity = %entity,
            linked = report.linked,
            removed = report.removed,
            physically_deleted = report.physically_deleted,
            policy = ?policy,
            "Synced inline images"
        );

        Ok(report)
    }

    /// Drop every image LINKED to a deleted entity.
    ///
    /// With physical deletion, any storage failure aborts before the registry
    /// changes, so the call can be retried as a whole.
    #[tracing::instrument(skip(self, params), fields(entity = %params.entity))]
    pub async fn remove_entity_images(
        &self,
        params: RemoveEntityImages,
    ) -> Result<RemoveReport, AppError> {
        self.purge_best_effort().await;

        let entity = params.entity;
        let policy = PhysicalDeletion::from_flag(params.delete_physically);

        let linked: Vec<String> = self
            .repository
            .list_linked(&entity)
            .await?
            .into_iter()
            .map(|asset| asset.url)
            .collect();

        let physically_deleted = if policy.deletes_objects() {
            self.delete_all_or_abort(&linked).await?
        } else {
            0
        };

        let removed = self.repository.delete_linked(&entity).await?;

        tracing::info!(
            entity = %entity,
            removed,
            physically_deleted,
            "Removed inline images of deleted entity"
        );

        Ok(RemoveReport {
            removed,
            physically_deleted,
        })
    }

    /// Reclaim up to `limit` expired TEMP uploads, soonest-expired first.
    ///
    /// A storage failure keeps that row for the next sweep and never fails the batch.
    #[tracing::instrument(skip(self), fields(cleanup.operation = "inline_media_purge"))]
    pub async fn purge_expired_temp_uploads(&self, limit: i64) -> Result<PurgeReport, AppError> {
        if limit <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Purge limit must be positive, got {}",
                limit
            )));
        }

        let now = self.clock.now();
        let expired = self.repository.list_expired_temp(now, limit).await?;

        let mut report = PurgeReport {
            examined: expired.len() as u64,
            ..PurgeReport::default()
        };

        for asset in expired {
            if let Err(e) = self.storage.delete(&asset.url).await {
                tracing::warn!(
                    error = %e,
                    url = %asset.url,
                    "Failed to delete expired inline upload, keeping it for the next sweep"
                );
                report.failed += 1;
                continue;
            }

            match self.repository.delete_temp(&asset.url).await {
                Ok(true) => report.purged += 1,
                Ok(false) => {
                    tracing::debug!(url = %asset.url, "Row no longer TEMP, left in place");
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        url = %asset.url,
                        "Failed to remove purged inline upload from registry"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.examined > 0 {
            tracing::info!(
                examined = report.examined,
                purged = report.purged,
                failed = report.failed,
                "Purged expired inline uploads"
            );
        }

        Ok(report)
    }

    /// TEMP / LINKED counts, optionally for one scope.
    pub async fn registry_summary(
        &self,
        scope: Option<InlineMediaScope>,
    ) -> Result<InlineMediaStatusCounts, AppError> {
        self.repository.count_by_status(scope).await
    }

    async fn purge_best_effort(&self) {
        if let Err(e) = self
            .purge_expired_temp_uploads(self.config.purge_batch_size)
            .await
        {
            tracing::error!(error = %e, "Inline media purge sweep failed");
        }
    }

    /// URLs whose objects may be deleted on behalf of `entity`: rows LINKED to
    /// it, or URLs the registry does not know. TEMP rows are left to the sweep
    /// and rows owned by another entity are never touched.
    async fn owned_by(&self, entity: &EntityRef, urls: &[String]) -> Result<Vec<String>, AppError> {
        let mut owned = Vec::with_capacity(urls.len());
        for url in urls {
            match self.repository.get_by_url(url).await? {
                None => owned.push(url.clone()),
                Some(asset) if asset.is_linked_to(entity) => owned.push(url.clone()),
                Some(asset) => {
                    tracing::debug!(
                        url = %url,
                        status = ?asset.status,
                        "Skipping physical delete of image not owned by entity"
                    );
                }
            }
        }
        Ok(owned)
    }

    /// Delete objects one by one, stopping at the first failure.
    async fn delete_all_or_abort(&self, urls: &[String]) -> Result<u64, AppError> {
        let mut deleted = 0;
        for url in urls {
            if let Err(e) = self.storage.delete(url).await {
                tracing::error!(
                    error = %e,
                    url = %url,
                    deleted_before_failure = deleted,
                    "Physical delete failed, registry left unchanged"
                );
                return Err(e);
            }
            deleted += 1;
        }
        Ok(deleted)
    }
}

/// Random object name keeping a sanitized extension of the client filename.
fn stored_filename(filename: &str) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_filename_keeps_safe_extension() {
        let name = stored_filename("Holiday Photo.JPG");
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), 36 + 4);
    }

    #[test]
    fn stored_filename_drops_odd_extension() {
        assert_eq!(stored_filename("archive").len(), 36);
        assert_eq!(stored_filename("x.p/ng").len(), 36);
        assert_eq!(stored_filename("x.verylongextension").len(), 36);
    }
}
