//! Kernel module - worker infrastructure and dependencies.

pub mod deps;
pub mod jobs;
pub mod memory_store;
pub mod pg_store;
pub mod scheduled_tasks;
pub mod store;
pub mod test_dependencies;
pub mod traits;

pub use deps::{EngineAdapter, WorkerDeps};
pub use memory_store::InMemoryStore;
pub use pg_store::PostgresStore;
pub use store::{BaseStore, StoreError, UpsertOutcome};
pub use test_dependencies::TestDependencies;
pub use traits::*;
