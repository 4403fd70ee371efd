// Content intelligence worker
//
// Runs discovery, analysis and maintenance jobs from a Postgres-backed queue.
// Each domain under domains/ owns its models, actions and job handlers;
// kernel/ holds the store, queue, worker loop and shared dependencies.

pub mod config;
pub mod domains;
pub mod kernel;

pub use config::Config;
