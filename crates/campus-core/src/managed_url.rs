//! Managed-URL classification.
//!
//! A URL is managed when it points into this deployment's own media store.
//! With a public media base configured, the URL must start with `{base}/`.
//! Without one, the legacy rule applies: the URL must contain the
//! `/inline-media/` path segment every inline upload key starts with.
//! Foreign URLs are never tracked, extracted or deleted.

use crate::config::InlineMediaConfig;

/// Path segment that identifies inline uploads when no public base is configured.
pub const LEGACY_MEDIA_SEGMENT: &str = "/inline-media/";

/// Prefix of every storage key holding an inline upload.
pub const INLINE_MEDIA_KEY_PREFIX: &str = "inline-media/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedUrlClassifier {
    /// Normalized base without trailing slash, with the separator appended.
    base_prefix: Option<String>,
}

impl ManagedUrlClassifier {
    pub fn new(public_media_base_url: Option<&str>) -> Self {
        let base_prefix = public_media_base_url
            .map(|b| b.trim().trim_end_matches('/'))
            .filter(|b| !b.is_empty())
            .map(|b| format!("{}/", b));
        Self { base_prefix }
    }

    pub fn from_config(config: &InlineMediaConfig) -> Self {
        Self::new(config.public_media_base_url())
    }

    pub fn is_managed(&self, url: &str) -> bool {
        match &self.base_prefix {
            Some(prefix) => url.starts_with(prefix.as_str()),
            None => url.contains(LEGACY_MEDIA_SEGMENT),
        }
    }

    /// Storage key addressed by a managed URL.
    ///
    /// Query strings and fragments are not part of the key. Returns `None` for
    /// unmanaged URLs, for URLs with nothing after the base and for keys with `..`.
    pub fn storage_key(&self, url: &str) -> Option<String> {
        if !self.is_managed(url) {
            return None;
        }

        let path = url.split(['?', '#']).next().unwrap_or(url);

        let key = match &self.base_prefix {
            Some(prefix) => path.strip_prefix(prefix.as_str())?,
            None => {
                let idx = path.find(LEGACY_MEDIA_SEGMENT)?;
                &path[idx + 1..]
            }
        };

        let key = key.trim_start_matches('/');
        if key.is_empty() || key.contains("..") {
            None
        } else {
            Some(key.to_string())
        }
    }

    /// Public URL for a storage key, when a base is configured.
    pub fn public_url(&self, storage_key: &str) -> Option<String> {
        self.base_prefix
            .as_ref()
            .map(|prefix| format!("{}{}", prefix, storage_key.trim_start_matches('/')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://cdn.school.test/media";

    #[test]
    fn base_rule_requires_separator() {
        let classifier = ManagedUrlClassifier::new(Some(BASE));
        assert!(classifier.is_managed("https://cdn.school.test/media/inline-media/feed/a.webp"));
        assert!(classifier.is_managed("https://cdn.school.test/media/x.png"));
        assert!(!classifier.is_managed("https://cdn.school.test/media-archive/x.png"));
        assert!(!classifier.is_managed("https://cdn.school.test/media"));
        assert!(!classifier.is_managed("https://elsewhere.test/media/x.png"));
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let classifier = ManagedUrlClassifier::new(Some("https://cdn.school.test/media/"));
        assert!(classifier.is_managed("https://cdn.school.test/media/x.png"));
        assert!(!classifier.is_managed("https://cdn.school.test/mediax.png"));
    }

    #[test]
    fn base_rule_ignores_legacy_segment() {
        let classifier = ManagedUrlClassifier::new(Some(BASE));
        assert!(!classifier.is_managed("https://old-bucket.test/inline-media/feed/a.webp"));
    }

    #[test]
    fn legacy_rule_without_base() {
        let classifier = ManagedUrlClassifier::new(None);
        assert!(classifier.is_managed("https://old-bucket.test/inline-media/feed/a.webp"));
        assert!(!classifier.is_managed("https://images.example.com/cat.png"));

        let blank = ManagedUrlClassifier::new(Some("   "));
        assert_eq!(blank, classifier);
    }

    #[test]
    fn storage_key_from_base() {
        let classifier = ManagedUrlClassifier::new(Some(BASE));
        assert_eq!(
            classifier.storage_key("https://cdn.school.test/media/inline-media/feed/t/a.webp?v=2"),
            Some("inline-media/feed/t/a.webp".to_string())
        );
        assert_eq!(classifier.storage_key("https://cdn.school.test/media/"), None);
        assert_eq!(classifier.storage_key("https://elsewhere.test/a.webp"), None);
    }

    #[test]
    fn storage_key_from_legacy_segment() {
        let classifier = ManagedUrlClassifier::new(None);
        let url = "https://old-bucket.test/bucket/inline-media/messaging/t/b.webp";
        assert_eq!(
            classifier.storage_key(url),
            Some("inline-media/messaging/t/b.webp".to_string())
        );
    }

    #[test]
    fn storage_key_rejects_parent_segments() {
        let classifier = ManagedUrlClassifier::new(Some(BASE));
        let url = "https://cdn.school.test/media/inline-media/../secrets.webp";
        assert!(classifier.is_managed(url));
        assert_eq!(classifier.storage_key(url), None);

        let legacy = ManagedUrlClassifier::new(None);
        assert_eq!(legacy.storage_key("https://old.test/inline-media/../x.webp"), None);
    }

    #[test]
    fn public_url_round_trips_key() {
        let classifier = ManagedUrlClassifier::new(Some(BASE));
        let url = classifier.public_url("inline-media/feed/t/a.webp").unwrap();
        assert_eq!(url, "https://cdn.school.test/media/inline-media/feed/t/a.webp");
        assert_eq!(
            classifier.storage_key(&url).as_deref(),
            Some("inline-media/feed/t/a.webp")
        );
        assert_eq!(ManagedUrlClassifier::new(None).public_url("k"), None);
    }
}
