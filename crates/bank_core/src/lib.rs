//! Shared banking dataset domain primitives.
//!
//! This crate owns record shapes, table schemas, object key conventions,
//! warehouse job contracts and the declarative pipeline definition. It
//! intentionally excludes cloud SDK and runtime concerns; those live in
//! `bank_pipeline`.

pub mod csv_codec;
pub mod error;
pub mod object_store;
pub mod pipeline;
pub mod records;
pub mod schedule;
pub mod schema;
pub mod storage_keys;
pub mod warehouse;

pub use error::{SchemaViolation, StoreError, TaskError, ValidationError};
pub use records::{AccountRecord, CustomerRecord, TableRecord};
