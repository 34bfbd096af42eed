//! Database repositories for the data access layer
//
// Inline media registry (trait, Postgres, in-memory)
pub mod inline_media;
pub mod inline_media_memory;
pub mod pool;

pub use inline_media::{EntitySyncOutcome, InlineMediaRepository, PgInlineMediaRepository};
pub use inline_media_memory::InMemoryInlineMediaRepository;
pub use pool::connect_pool;
