#![deny(unused)]
//! Storage backends for FlyID.
//!
//! Object storage holds captured images; record storage holds the catch
//! records produced by accepted analyses.

pub mod memory;
pub mod s3;
pub mod sqlite;

pub use memory::{InMemoryObjectStore, InMemoryRecordStore};
pub use s3::{S3ObjectStore, DEFAULT_URL_TTL};
pub use sqlite::SqliteRecordStore;
