//! In-process warehouse backed by parquet objects.

pub mod columnar;
pub mod local;
