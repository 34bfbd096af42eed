use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Lifecycle status of a registered inline image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "inline_media_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum InlineMediaStatus {
    /// Uploaded, not referenced by any saved body yet.
    Temp,
    /// Referenced by the saved body of exactly one entity.
    Linked,
}

/// Feature area that owns an upload. Bookkeeping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "inline_media_scope", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InlineMediaScope {
    Feed,
    Messaging,
}

impl InlineMediaScope {
    /// Path segment used in storage keys for uploads of this scope.
    pub fn storage_segment(&self) -> &'static str {
        match self {
            InlineMediaScope::Feed => "feed",
            InlineMediaScope::Messaging => "messaging",
        }
    }
}

impl Display for InlineMediaScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InlineMediaScope::Feed => write!(f, "FEED"),
            InlineMediaScope::Messaging => write!(f, "MESSAGING"),
        }
    }
}

/// Kind of content item whose body embeds images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "inline_media_entity_type", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InlineMediaEntityType {
    FeedPost,
    InternalMessage,
}

impl Display for InlineMediaEntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InlineMediaEntityType::FeedPost => write!(f, "FEED_POST"),
            InlineMediaEntityType::InternalMessage => write!(f, "INTERNAL_MESSAGE"),
        }
    }
}

/// Identifies the content item that owns LINKED images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: InlineMediaEntityType,
    pub entity_id: Uuid,
}

impl EntityRef {
    pub fn new(entity_type: InlineMediaEntityType, entity_id: Uuid) -> Self {
        Self {
            entity_type,
            entity_id,
        }
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.entity_type, self.entity_id)
    }
}

/// Who uploaded an image and for which feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProvenance {
    pub tenant_id: Uuid,
    pub uploaded_by_user_id: Uuid,
    pub scope: InlineMediaScope,
}

/// Registry row for one managed URL.
///
/// LINKED rows always carry an entity and no expiry; TEMP rows carry an expiry
/// and no entity. The URL is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct InlineMediaAsset {
    pub url: String,
    pub scope: InlineMediaScope,
    pub status: InlineMediaStatus,
    pub tenant_id: Uuid,
    pub uploaded_by_user_id: Uuid,
    pub entity_type: Option<InlineMediaEntityType>,
    pub entity_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InlineMediaAsset {
    /// Build a fresh TEMP row.
    pub fn new_temp(new: &NewTempAsset, now: DateTime<Utc>) -> Self {
        Self {
            url: new.url.clone(),
            scope: new.provenance.scope,
            status: InlineMediaStatus::Temp,
            tenant_id: new.provenance.tenant_id,
            uploaded_by_user_id: new.provenance.uploaded_by_user_id,
            entity_type: None,
            entity_id: None,
            expires_at: Some(new.expires_at),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_temp(&self) -> bool {
        self.status == InlineMediaStatus::Temp
    }

    pub fn is_linked(&self) -> bool {
        self.status == InlineMediaStatus::Linked
    }

    /// Owning entity, for LINKED rows.
    pub fn entity(&self) -> Option<EntityRef> {
        match (self.entity_type, self.entity_id) {
            (Some(entity_type), Some(entity_id)) => Some(EntityRef::new(entity_type, entity_id)),
            _ => None,
        }
    }

    pub fn is_linked_to(&self, entity: &EntityRef) -> bool {
        self.is_linked() && self.entity().as_ref() == Some(entity)
    }

    /// TEMP row whose expiry is at or before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_temp() && self.expires_at.is_some_and(|at| at <= now)
    }

    /// Status, entity and expiry agree with each other.
    pub fn is_consistent(&self) -> bool {
        let has_entity = self.entity_type.is_some() && self.entity_id.is_some();
        let no_entity = self.entity_type.is_none() && self.entity_id.is_none();
        match self.status {
            InlineMediaStatus::Linked => has_entity && self.expires_at.is_none(),
            InlineMediaStatus::Temp => no_entity && self.expires_at.is_some(),
        }
    }
}

/// Input for registering a TEMP upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTempAsset {
    pub url: String,
    pub provenance: UploadProvenance,
    pub expires_at: DateTime<Utc>,
}

/// Registry bookkeeping counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineMediaStatusCounts {
    pub temp: i64,
    pub linked: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_asset(now: DateTime<Utc>) -> InlineMediaAsset {
        let new = NewTempAsset {
            url: "https://cdn.school.test/media/inline-media/feed/a.webp".to_string(),
            provenance: UploadProvenance {
                tenant_id: Uuid::new_v4(),
                uploaded_by_user_id: Uuid::new_v4(),
                scope: InlineMediaScope::Feed,
            },
            expires_at: now + Duration::minutes(60),
        };
        InlineMediaAsset::new_temp(&new, now)
    }

    #[test]
    fn new_temp_is_consistent() {
        let now = Utc::now();
        let asset = temp_asset(now);
        assert!(asset.is_temp());
        assert!(asset.is_consistent());
        assert_eq!(asset.entity(), None);
    }

    #[test]
    fn linked_row_without_entity_is_inconsistent() {
        let mut asset = temp_asset(Utc::now());
        asset.status = InlineMediaStatus::Linked;
        asset.expires_at = None;
        assert!(!asset.is_consistent());

        let entity = EntityRef::new(InlineMediaEntityType::FeedPost, Uuid::new_v4());
        asset.entity_type = Some(entity.entity_type);
        asset.entity_id = Some(entity.entity_id);
        assert!(asset.is_consistent());
        assert!(asset.is_linked_to(&entity));
    }

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        let asset = temp_asset(now);
        assert!(!asset.is_expired(now));
        assert!(asset.is_expired(now + Duration::minutes(60)));
        assert!(asset.is_expired(now + Duration::minutes(61)));
    }

    #[test]
    fn enums_serialize_in_screaming_case() {
        assert_eq!(
            serde_json::to_string(&InlineMediaEntityType::InternalMessage).unwrap(),
            "\"INTERNAL_MESSAGE\""
        );
        assert_eq!(
            serde_json::to_string(&InlineMediaStatus::Linked).unwrap(),
            "\"LINKED\""
        );
        assert_eq!(InlineMediaScope::Messaging.to_string(), "MESSAGING");
        assert_eq!(InlineMediaScope::Feed.storage_segment(), "feed");
    }
}
