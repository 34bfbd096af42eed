//! In-memory inline media registry
//!
//! Same contract as the PostgreSQL repository, backed by a map keyed by URL.
//! Used by tests and by local runs without a database.

use async_trait::async_trait;
use campus_core::models::{
    EntityRef, InlineMediaAsset, InlineMediaScope, InlineMediaStatus, InlineMediaStatusCounts,
    NewTempAsset, UploadProvenance,
};
use campus_core::AppError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::inline_media::{EntitySyncOutcome, InlineMediaRepository};

#[derive(Clone, Default)]
pub struct InMemoryInlineMediaRepository {
    assets: Arc<Mutex<HashMap<String, InlineMediaAsset>>>,
}

impl InMemoryInlineMediaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row, ordered by URL.
    pub fn all(&self) -> Result<Vec<InlineMediaAsset>, AppError> {
        let assets = self.lock()?;
        let mut rows: Vec<_> = assets.values().cloned().collect();
        rows.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(rows)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, InlineMediaAsset>>, AppError> {
        self.assets
            .lock()
            .map_err(|_| AppError::Internal("inline media registry lock poisoned".to_string()))
    }
}

fn link(
    assets: &mut HashMap<String, InlineMediaAsset>,
    url: &str,
    entity: &EntityRef,
    provenance: &UploadProvenance,
    now: DateTime<Utc>,
) {
    let row = assets
        .entry(url.to_string())
        .or_insert_with(|| InlineMediaAsset {
            url: url.to_string(),
            scope: provenance.scope,
            status: InlineMediaStatus::Linked,
            tenant_id: provenance.tenant_id,
            uploaded_by_user_id: provenance.uploaded_by_user_id,
            entity_type: None,
            entity_id: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        });
    row.status = InlineMediaStatus::Linked;
    row.entity_type = Some(entity.entity_type);
    row.entity_id = Some(entity.entity_id);
    row.expires_at = None;
    row.updated_at = now;
}

#[async_trait]
impl InlineMediaRepository for InMemoryInlineMediaRepository {
    async fn get_by_url(&self, url: &str) -> Result<Option<InlineMediaAsset>, AppError> {
        Ok(self.lock()?.get(url).cloned())
    }

    async fn upsert_temp(&self, new: &NewTempAsset) -> Result<InlineMediaAsset, AppError> {
        let now = Utc::now();
        let mut assets = self.lock()?;
        let row = match assets.get_mut(&new.url) {
            Some(existing) if existing.is_linked() => existing.clone(),
            Some(existing) => {
                existing.scope = new.provenance.scope;
                existing.tenant_id = new.provenance.tenant_id;
                existing.uploaded_by_user_id = new.provenance.uploaded_by_user_id;
                existing.expires_at = Some(new.expires_at);
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let row = InlineMediaAsset::new_temp(new, now);
                assets.insert(new.url.clone(), row.clone());
                row
            }
        };
        Ok(row)
    }

    async fn list_linked(&self, entity: &EntityRef) -> Result<Vec<InlineMediaAsset>, AppError> {
        let assets = self.lock()?;
        let mut rows: Vec<_> = assets
            .values()
            .filter(|a| a.is_linked_to(entity))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.url.cmp(&b.url)));
        Ok(rows)
    }

    async fn apply_entity_sync(
        &self,
        entity: &EntityRef,
        provenance: &UploadProvenance,
        removed_urls: &[String],
        next_urls: &[String],
    ) -> Result<EntitySyncOutcome, AppError> {
        let now = Utc::now();
        let mut assets = self.lock()?;

        let mut removed = 0;
        for url in removed_urls {
            if assets.get(url).is_some_and(|a| a.is_linked_to(entity)) {
                assets.remove(url);
                removed += 1;
            }
        }

        for url in next_urls {
            link(&mut assets, url, entity, provenance, now);
        }

        Ok(EntitySyncOutcome {
            removed,
            linked: next_urls.len() as u64,
        })
    }

    async fn delete_linked(&self, entity: &EntityRef) -> Result<u64, AppError> {
        let mut assets = self.lock()?;
        let before = assets.len();
        assets.retain(|_, a| !a.is_linked_to(entity));
        Ok((before - assets.len()) as u64)
    }

    async fn list_expired_temp(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<InlineMediaAsset>, AppError> {
        let assets = self.lock()?;
        let mut rows: Vec<_> = assets
            .values()
            .filter(|a| a.is_expired(now))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.url.cmp(&b.url)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn delete_temp(&self, url: &str) -> Result<bool, AppError> {
        let mut assets = self.lock()?;
        if assets.get(url).is_some_and(|a| a.is_temp()) {
            assets.remove(url);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn count_by_status(
        &self,
        scope: Option<InlineMediaScope>,
    ) -> Result<InlineMediaStatusCounts, AppError> {
        let assets = self.lock()?;
        let mut counts = InlineMediaStatusCounts::default();
        for asset in assets.values().filter(|a| scope.is_none_or(|s| a.scope == s)) {
            match asset.status {
                InlineMediaStatus::Temp => counts.temp += 1,
                InlineMediaStatus::Linked => counts.linked += 1,
            }
        }
        Ok(counts)
    }
}
