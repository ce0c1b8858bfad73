//! Data models for harbor-migrate

pub mod migration_run;

pub use migration_run::{MigrationRun, MigrationState, StateTransition};
