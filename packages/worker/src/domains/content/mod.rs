//! Content domain - discovered items and the entities mentioned in them.

pub mod models;

pub use models::*;
