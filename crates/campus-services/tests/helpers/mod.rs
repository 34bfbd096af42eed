//! Test helpers: an in-memory registry, a recording storage backend and a
//! controllable clock wired into an `InlineMediaLifecycleService`.
//!
//! Run with: `cargo test -p campus-services`

#![allow(dead_code)]

pub mod clock;
pub mod storage;

use campus_core::models::{EntityRef, InlineMediaEntityType, InlineMediaScope};
use campus_core::InlineMediaConfig;
use campus_db::InMemoryInlineMediaRepository;
use campus_services::{InlineMediaLifecycleService, SyncEntityImages, TimeProvider};
use campus_storage::{MediaStorageClient, Storage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub use clock::FixedClock;
pub use storage::MockStorage;

pub const MEDIA_BASE_URL: &str = "https://media.campus.test";
pub const TEMP_TTL_MINUTES: i64 = 60;

/// Lifecycle service plus handles on its collaborators.
pub struct TestLifecycle {
    pub service: InlineMediaLifecycleService,
    pub registry: InMemoryInlineMediaRepository,
    pub storage: Arc<MockStorage>,
    pub clock: FixedClock,
    pub tenant_id: Uuid,
    pub uploader_id: Uuid,
}

pub fn inline_media_config(environment: &str) -> InlineMediaConfig {
    InlineMediaConfig::new(Some(MEDIA_BASE_URL.to_string()), environment)
        .with_temp_ttl_minutes(TEMP_TTL_MINUTES)
}

pub fn setup_lifecycle() -> TestLifecycle {
    setup_lifecycle_in("development")
}

pub fn setup_lifecycle_in(environment: &str) -> TestLifecycle {
    setup_lifecycle_with(inline_media_config(environment))
}

pub fn setup_lifecycle_with(config: InlineMediaConfig) -> TestLifecycle {
    let registry = InMemoryInlineMediaRepository::new();
    let storage = Arc::new(MockStorage::new(MEDIA_BASE_URL));
    let clock = FixedClock::default();

    let backend: Arc<dyn Storage> = storage.clone();
    let client = MediaStorageClient::new(Some(backend), &config);
    let service = InlineMediaLifecycleService::new(Arc::new(registry.clone()), client, config)
        .with_time_provider(Arc::new(clock.clone()));

    TestLifecycle {
        service,
        registry,
        storage,
        clock,
        tenant_id: Uuid::new_v4(),
        uploader_id: Uuid::new_v4(),
    }
}

impl TestLifecycle {
    /// Managed URL for an object of this tenant.
    pub fn url(&self, name: &str) -> String {
        format!(
            "{}/inline-media/feed/{}/{}",
            MEDIA_BASE_URL, self.tenant_id, name
        )
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn register(&self, url: &str) {
        self.service
            .register_temp_upload(self.tenant_id, self.uploader_id, InlineMediaScope::Feed, url)
            .await
            .expect("register_temp_upload")
            .expect("managed URL");
    }

    pub fn sync(&self, entity: EntityRef, next_body_html: &str) -> SyncEntityImages {
        SyncEntityImages {
            tenant_id: self.tenant_id,
            uploader_id: self.uploader_id,
            scope: InlineMediaScope::Feed,
            entity,
            next_body_html: next_body_html.to_string(),
            previous_body_html: None,
            delete_removed_physically: false,
        }
    }

    /// LINKED URLs of an entity, sorted.
    pub fn linked_urls(&self, entity: &EntityRef) -> Vec<String> {
        self.registry
            .all()
            .expect("registry snapshot")
            .into_iter()
            .filter(|asset| asset.is_linked_to(entity))
            .map(|asset| asset.url)
            .collect()
    }

    pub fn temp_urls(&self) -> Vec<String> {
        self.registry
            .all()
            .expect("registry snapshot")
            .into_iter()
            .filter(|asset| asset.is_temp())
            .map(|asset| asset.url)
            .collect()
    }
}

pub fn feed_post() -> EntityRef {
    EntityRef::new(InlineMediaEntityType::FeedPost, Uuid::new_v4())
}

pub fn img(url: &str) -> String {
    format!(r#"<img src="{}">"#, url)
}
