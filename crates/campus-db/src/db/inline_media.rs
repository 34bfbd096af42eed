//! Inline media registry: one row per managed URL in `inline_media_assets`.

use async_trait::async_trait;
use campus_core::models::{
    EntityRef, InlineMediaAsset, InlineMediaScope, InlineMediaStatus, InlineMediaStatusCounts,
    NewTempAsset, UploadProvenance,
};
use campus_core::AppError;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

/// Row counts produced by [`InlineMediaRepository::apply_entity_sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntitySyncOutcome {
    /// Rows deleted because the entity no longer references them.
    pub removed: u64,
    /// Rows now LINKED to the entity (inserted, promoted or re-affirmed).
    pub linked: u64,
}

/// Registry operations used by the inline media lifecycle.
///
/// Implementations keep the status invariants: LINKED rows carry an entity and
/// no expiry, TEMP rows carry an expiry and no entity.
#[async_trait]
pub trait InlineMediaRepository: Send + Sync {
    /// Fetch the row for a URL.
    async fn get_by_url(&self, url: &str) -> Result<Option<InlineMediaAsset>, AppError>;

    /// Insert a TEMP row, or refresh an existing TEMP row's provenance and expiry.
    ///
    /// A LINKED row is never downgraded; it is returned unchanged.
    async fn upsert_temp(&self, new: &NewTempAsset) -> Result<InlineMediaAsset, AppError>;

    /// All rows currently LINKED to an entity.
    async fn list_linked(&self, entity: &EntityRef) -> Result<Vec<InlineMediaAsset>, AppError>;

    /// Atomically delete `removed_urls` that are LINKED to `entity`, then upsert
    /// every URL in `next_urls` to LINKED for `entity`.
    ///
    /// Rows created here take `provenance`; existing rows keep theirs.
    async fn apply_entity_sync(
        &self,
        entity: &EntityRef,
        provenance: &UploadProvenance,
        removed_urls: &[String],
        next_urls: &[String],
    ) -> Result<EntitySyncOutcome, AppError>;

    /// Delete every row LINKED to an entity.
    async fn delete_linked(&self, entity: &EntityRef) -> Result<u64, AppError>;

    /// TEMP rows expired at `now`, soonest expiry first.
    async fn list_expired_temp(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<InlineMediaAsset>, AppError>;

    /// Delete a row only while it is still TEMP. Returns whether a row was deleted.
    async fn delete_temp(&self, url: &str) -> Result<bool, AppError>;

    /// TEMP / LINKED counts, optionally restricted to one scope.
    async fn count_by_status(
        &self,
        scope: Option<InlineMediaScope>,
    ) -> Result<InlineMediaStatusCounts, AppError>;
}

/// PostgreSQL implementation.
#[derive(Clone)]
pub struct PgInlineMediaRepository {
    pool: PgPool,
}

impl PgInlineMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn link_tx(
        tx: &mut Transaction<'_, Postgres>,
        url: &str,
        entity: &EntityRef,
        provenance: &UploadProvenance,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO inline_media_assets (
                url, scope, status, tenant_id, uploaded_by_user_id,
                entity_type, entity_id, expires_at
            )
            VALUES ($1, $2, 'LINKED', $3, $4, $5, $6, NULL)
            ON CONFLICT (url) DO UPDATE SET
                status = 'LINKED',
                entity_type = EXCLUDED.entity_type,
                entity_id = EXCLUDED.entity_id,
                expires_at = NULL,
                updated_at = NOW()
            "#,
        )
        .bind(url)
        .bind(provenance.scope)
        .bind(provenance.tenant_id)
        .bind(provenance.uploaded_by_user_id)
        .bind(entity.entity_type)
        .bind(entity.entity_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl InlineMediaRepository for PgInlineMediaRepository {
    #[tracing::instrument(skip(self), fields(db.table = "inline_media_assets"))]
    async fn get_by_url(&self, url: &str) -> Result<Option<InlineMediaAsset>, AppError> {
        let row = sqlx::query_as::<Postgres, InlineMediaAsset>(
            r#"
            SELECT url, scope, status, tenant_id, uploaded_by_user_id,
                   entity_type, entity_id, expires_at, created_at, updated_at
            FROM inline_media_assets
            WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(
        skip(self, new),
        fields(db.table = "inline_media_assets", url = %new.url)
    )]
    async fn upsert_temp(&self, new: &NewTempAsset) -> Result<InlineMediaAsset, AppError> {
        let upserted = sqlx::query_as::<Postgres, InlineMediaAsset>(
            r#"
            INSERT INTO inline_media_assets (
                url, scope, status, tenant_id, uploaded_by_user_id,
                entity_type, entity_id, expires_at
            )
            VALUES ($1, $2, 'TEMP', $3, $4, NULL, NULL, $5)
            ON CONFLICT (url) DO UPDATE SET
                scope = EXCLUDED.scope,
                tenant_id = EXCLUDED.tenant_id,
                uploaded_by_user_id = EXCLUDED.uploaded_by_user_id,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            WHERE inline_media_assets.status = 'TEMP'
            RETURNING url, scope, status, tenant_id, uploaded_by_user_id,
                      entity_type, entity_id, expires_at, created_at, updated_at
            "#,
        )
        .bind(&new.url)
        .bind(new.provenance.scope)
        .bind(new.provenance.tenant_id)
        .bind(new.provenance.uploaded_by_user_id)
        .bind(new.expires_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = upserted {
            return Ok(row);
        }

        // Conflict with a LINKED row: nothing was written.
        self.get_by_url(&new.url).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "inline media row for {} vanished during upsert",
                new.url
            ))
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "inline_media_assets", entity = %entity))]
    async fn list_linked(&self, entity: &EntityRef) -> Result<Vec<InlineMediaAsset>, AppError> {
        let rows = sqlx::query_as::<Postgres, InlineMediaAsset>(
            r#"
            SELECT url, scope, status, tenant_id, uploaded_by_user_id,
                   entity_type, entity_id, expires_at, created_at, updated_at
            FROM inline_media_assets
            WHERE status = 'LINKED' AND entity_type = $1 AND entity_id = $2
            ORDER BY created_at, url
            "#,
        )
        .bind(entity.entity_type)
        .bind(entity.entity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(
        skip(self, provenance, removed_urls, next_urls),
        fields(
            db.table = "inline_media_assets",
            entity = %entity,
            removed = removed_urls.len(),
            next = next_urls.len()
        )
    )]
    async fn apply_entity_sync(
        &self,
        entity: &EntityRef,
        provenance: &UploadProvenance,
        removed_urls: &[String],
        next_urls: &[String],
    ) -> Result<EntitySyncOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = if removed_urls.is_empty() {
            0
        } else {
            sqlx::query(
                r#"
                DELETE FROM inline_media_assets
                WHERE url = ANY($1)
                  AND status = 'LINKED'
                  AND entity_type = $2
                  AND entity_id = $3
                "#,
            )
            .bind(removed_urls)
            .bind(entity.entity_type)
            .bind(entity.entity_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        };

        for url in next_urls {
            Self::link_tx(&mut tx, url, entity, provenance).await?;
        }

        tx.commit().await?;

        Ok(EntitySyncOutcome {
            removed,
            linked: next_urls.len() as u64,
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "inline_media_assets", entity = %entity))]
    async fn delete_linked(&self, entity: &EntityRef) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM inline_media_assets
            WHERE status = 'LINKED' AND entity_type = $1 AND entity_id = $2
            "#,
        )
        .bind(entity.entity_type)
        .bind(entity.entity_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(db.table = "inline_media_assets"))]
    async fn list_expired_temp(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<InlineMediaAsset>, AppError> {
        let rows = sqlx::query_as::<Postgres, InlineMediaAsset>(
            r#"
            SELECT url, scope, status, tenant_id, uploaded_by_user_id,
                   entity_type, entity_id, expires_at, created_at, updated_at
            FROM inline_media_assets
            WHERE status = 'TEMP' AND expires_at <= $1
            ORDER BY expires_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "inline_media_assets"))]
    async fn delete_temp(&self, url: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM inline_media_assets WHERE url = $1 AND status = 'TEMP'",
        )
        .bind(url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "inline_media_assets"))]
    async fn count_by_status(
        &self,
        scope: Option<InlineMediaScope>,
    ) -> Result<InlineMediaStatusCounts, AppError> {
        let rows: Vec<(InlineMediaStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)
            FROM inline_media_assets
            WHERE $1::inline_media_scope IS NULL OR scope = $1
            GROUP BY status
            "#,
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = InlineMediaStatusCounts::default();
        for (status, count) in rows {
            match status {
                InlineMediaStatus::Temp => counts.temp = count,
                InlineMediaStatus::Linked => counts.linked = count,
            }
        }
        Ok(counts)
    }
}
