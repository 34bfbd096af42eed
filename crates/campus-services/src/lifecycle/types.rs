use campus_core::models::{EntityRef, InlineMediaScope, UploadProvenance};
use serde::Serialize;
use uuid::Uuid;

/// Input of `sync_entity_images`, called on create and on every update of an
/// owning content item.
#[derive(Debug, Clone)]
pub struct SyncEntityImages {
    pub tenant_id: Uuid,
    pub uploader_id: Uuid,
    pub scope: InlineMediaScope,
    pub entity: EntityRef,
    pub next_body_html: String,
    /// Body before the edit. Its managed images are added to the registry's
    /// LINKED set for the entity when computing removals.
    pub previous_body_html: Option<String>,
    pub delete_removed_physically: bool,
}

impl SyncEntityImages {
    pub fn provenance(&self) -> UploadProvenance {
        UploadProvenance {
            tenant_id: self.tenant_id,
            uploaded_by_user_id: self.uploader_id,
            scope: self.scope,
        }
    }
}

/// Input of `remove_entity_images`, called when an owning item is deleted.
#[derive(Debug, Clone, Copy)]
pub struct RemoveEntityImages {
    pub entity: EntityRef,
    pub delete_physically: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// URLs LINKED to the entity after the call.
    pub linked: u64,
    /// Registry rows deleted because the body dropped them.
    pub removed: u64,
    pub physically_deleted: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemoveReport {
    pub removed: u64,
    pub physically_deleted: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// Expired TEMP rows selected for this sweep.
    pub examined: u64,
    pub purged: u64,
    /// Rows left in place after a storage failure; retried next sweep.
    pub failed: u64,
}
