//! Shared key generation for storage backends.
//!
//! Key format: `inline-media/{kind}/{tenant_id}/{filename}`.

use campus_core::managed_url::INLINE_MEDIA_KEY_PREFIX;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// Generate a storage key for the given upload kind, tenant and filename.
///
/// `kind` and `filename` must be single path segments.
pub fn generate_storage_key(tenant_id: Uuid, kind: &str, filename: &str) -> StorageResult<String> {
    for segment in [kind, filename] {
        if segment.is_empty() || segment.contains('/') || segment.contains("..") {
            return Err(StorageError::InvalidKey(format!(
                "Invalid key segment: {:?}",
                segment
            )));
        }
    }
    Ok(format!(
        "{}{}/{}/{}",
        INLINE_MEDIA_KEY_PREFIX, kind, tenant_id, filename
    ))
}

/// Reject keys that could escape the storage root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        let tenant = Uuid::nil();
        assert_eq!(
            generate_storage_key(tenant, "feed", "a.webp").unwrap(),
            format!("inline-media/feed/{}/a.webp", tenant)
        );
    }

    #[test]
    fn rejects_path_segments() {
        let tenant = Uuid::new_v4();
        assert!(generate_storage_key(tenant, "feed", "../a.webp").is_err());
        assert!(generate_storage_key(tenant, "feed/x", "a.webp").is_err());
        assert!(generate_storage_key(tenant, "feed", "").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("inline-media/../x").is_err());
        assert!(validate_key("inline-media/feed/x").is_ok());
    }
}
