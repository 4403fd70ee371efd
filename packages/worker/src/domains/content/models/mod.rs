pub mod content_entity;
pub mod content_item;
pub mod entity;

pub use content_entity::ContentEntity;
pub use content_item::{
    ContentItem, ContentStatus, EmbeddedContent, Platform, SourceType, UpsertContentItem,
};
pub use entity::{normalize_label, Entity, EntityType};
