//! Projects domain - project context plus the notification and audit side
//! effects written when jobs finish.

pub mod models;

pub use models::*;
