//! Campus Storage Library
//!
//! Storage abstraction for inline media: the `Storage` trait, local filesystem
//! and S3 backends, and the URL-level `MediaStorageClient` used by the
//! lifecycle service.
//!
//! # Storage key format
//!
//! Every inline upload lives under `inline-media/{kind}/{tenant_id}/{filename}`,
//! where `kind` is the owning feature's path segment (`feed`, `messaging`).
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in
//! the `keys` module so all backends stay consistent.

pub mod client;
pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use campus_core::StorageBackend;
pub use client::{MediaStorageClient, UploadedObject};
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
