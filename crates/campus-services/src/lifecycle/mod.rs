//! Inline media lifecycle
//!
//! Keeps the registry consistent with the saved bodies of feed posts and
//! internal messages: uploads start TEMP, become LINKED when a saved body
//! references them, and are reclaimed when dropped or left unreferenced past
//! their time-to-live.

mod clock;
mod policy;
mod service;
mod types;

pub use clock::{SystemTimeProvider, TimeProvider};
pub use policy::PhysicalDeletion;
pub use service::InlineMediaLifecycleService;
pub use types::{PurgeReport, RemoveEntityImages, RemoveReport, SyncEntityImages, SyncReport};
