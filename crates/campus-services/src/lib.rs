//! Campus services
//!
//! Business services built on the core, db and storage crates. The inline
//! media lifecycle tracks images embedded in rich-text bodies from upload to
//! deletion.

pub mod lifecycle;

pub use lifecycle::{
    InlineMediaLifecycleService, PhysicalDeletion, PurgeReport, RemoveEntityImages, RemoveReport,
    SyncEntityImages, SyncReport, SystemTimeProvider, TimeProvider,
};
