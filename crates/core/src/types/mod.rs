//! Core type definitions for FlyID.
//!
//! - `analysis`: the model output contract
//! - `chat`: conversation turns
//! - `completion`: provider-neutral completion request/response
//! - `image`: encoded image payloads
//! - `record`: persisted catch records

pub mod analysis;
pub mod chat;
pub mod completion;
pub mod image;
pub mod record;

pub use analysis::*;
pub use chat::*;
pub use completion::*;
pub use image::*;
pub use record::*;
