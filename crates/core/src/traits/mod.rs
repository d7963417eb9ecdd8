//! Core traits for FlyID.
//!
//! Traits sit at the seams between the pipeline and external services:
//! - `llm`: completion endpoint (LlmClient)
//! - `store`: object storage and record store (ObjectStore, RecordStore)
//! - `source`: local image bytes (ImageSource)
//! - `sink`: persistence of accepted analyses (CaptureSink)

pub mod llm;
pub mod sink;
pub mod source;
pub mod store;

pub use llm::*;
pub use sink::*;
pub use source::*;
pub use store::*;
