//! Campus Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! inline media URL helpers (managed-URL classification and reference extraction)
//! shared across all Campus components.

pub mod config;
pub mod error;
pub mod inline_refs;
pub mod managed_url;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, InlineMediaConfig};
pub use error::AppError;
pub use inline_refs::{ImgTagExtractor, InlineReferenceExtractor};
pub use managed_url::ManagedUrlClassifier;
pub use storage_types::StorageBackend;
