//! Reference extraction from rich-text bodies.
//!
//! Only the `<img ... src="...">` embedding pattern is recognized. Matching is
//! on tag shape, not on parsed markup: malformed fragments are skipped.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::managed_url::ManagedUrlClassifier;

/// Finds the managed URLs a body embeds.
pub trait InlineReferenceExtractor: Send + Sync {
    fn extract(&self, body: &str) -> HashSet<String>;
}

static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("img src pattern is valid")
});

/// Tag-shape extractor for `<img>` elements.
#[derive(Debug, Clone)]
pub struct ImgTagExtractor {
    classifier: ManagedUrlClassifier,
}

impl ImgTagExtractor {
    pub fn new(classifier: ManagedUrlClassifier) -> Self {
        Self { classifier }
    }
}

impl InlineReferenceExtractor for ImgTagExtractor {
    fn extract(&self, body: &str) -> HashSet<String> {
        if body.is_empty() {
            return HashSet::new();
        }

        IMG_SRC_RE
            .captures_iter(body)
            .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
            .map(|m| m.as_str().trim())
            .filter(|src| !src.is_empty() && self.classifier.is_managed(src))
            .map(str::to_string)
            .collect()
    }
}
