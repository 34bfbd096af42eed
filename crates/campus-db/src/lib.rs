//! Campus database layer
//!
//! Asset Registry for inline media: the `InlineMediaRepository` trait with a
//! PostgreSQL implementation and an in-memory implementation.

pub mod db;

pub use db::{
    connect_pool, EntitySyncOutcome, InMemoryInlineMediaRepository, InlineMediaRepository,
    PgInlineMediaRepository,
};
