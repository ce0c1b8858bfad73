//! # Harbor Common Library
//!
//! Shared code for the Harbor listing services:
//! - Common error type
//! - TOML configuration loading and config path resolution
//! - Canonical yacht schema (fields, record, provenance, migration result)

pub mod config;
pub mod error;
pub mod yacht;

pub use error::{Error, Result};
pub use yacht::{
    CanonicalField, CanonicalYacht, FieldProvenance, MigrationMetadata, MigrationResult,
    Provenance,
};
