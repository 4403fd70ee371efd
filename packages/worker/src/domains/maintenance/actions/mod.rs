mod purge_audit_logs;

pub use purge_audit_logs::{purge_audit_logs, PurgeSummary};
