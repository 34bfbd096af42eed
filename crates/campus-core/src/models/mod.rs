pub mod inline_media;

pub use inline_media::{
    EntityRef, InlineMediaAsset, InlineMediaEntityType, InlineMediaScope, InlineMediaStatus,
    InlineMediaStatusCounts, NewTempAsset, UploadProvenance,
};
