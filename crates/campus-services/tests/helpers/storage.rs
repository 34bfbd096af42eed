use async_trait::async_trait;
use campus_storage::{Storage, StorageBackend, StorageError, StorageResult};
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

/// Storage backend that records calls and fails deletes for chosen URLs.
pub struct MockStorage {
    base_url: String,
    objects: Mutex<HashSet<String>>,
    delete_calls: Mutex<Vec<String>>,
    failing_keys: Mutex<HashSet<String>>,
}

impl MockStorage {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: Mutex::new(HashSet::new()),
            delete_calls: Mutex::new(Vec::new()),
            failing_keys: Mutex::new(HashSet::new()),
        }
    }

    fn key_of(&self, url: &str) -> String {
        url.strip_prefix(&format!("{}/", self.base_url))
            .unwrap_or(url)
            .to_string()
    }

    /// Make every delete of `url` fail until `heal` is called.
    pub fn fail_deletes_for(&self, url: &str) {
        let key = self.key_of(url);
        self.failing_keys.lock().unwrap().insert(key);
    }

    pub fn heal(&self) {
        self.failing_keys.lock().unwrap().clear();
    }

    /// URLs of every delete attempt, in call order.
    pub fn delete_calls(&self) -> Vec<String> {
        self.delete_calls
            .lock()
            .unwrap()
            .iter()
            .map(|key| self.public_url(key))
            .collect()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.objects.lock().unwrap().contains(&self.key_of(url))
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload(
        &self,
        tenant_id: Uuid,
        kind: &str,
        filename: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let key = format!("inline-media/{}/{}/{}", kind, tenant_id, filename);
        self.objects.lock().unwrap().insert(key.clone());
        let url = self.public_url(&key);
        Ok((key, url))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.delete_calls
            .lock()
            .unwrap()
            .push(storage_key.to_string());
        if self.failing_keys.lock().unwrap().contains(storage_key) {
            return Err(StorageError::DeleteFailed(format!(
                "simulated failure for {}",
                storage_key
            )));
        }
        if !self.objects.lock().unwrap().remove(storage_key) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains(storage_key))
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url, storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
