pub mod audit_log;
pub mod notification;
pub mod project;

pub use audit_log::{AuditLog, CreateAuditLog};
pub use notification::{CreateNotification, Notification, NotificationType};
pub use project::Project;
