#![deny(unused)]
//! HTTP gateway for FlyID.
//!
//! This crate wires the image encoder, the model clients and the
//! persistence gateway together and exposes them over HTTP.

pub mod bootstrap;
pub mod encoder;
pub mod persistence;
pub mod server;
pub mod service;
pub mod source;
pub mod tracing_layer;

pub use bootstrap::{build_image_source, build_object_store, build_record_store, build_service};
pub use encoder::ImageEncoder;
pub use persistence::{PersistenceGateway, DEFAULT_CAPTURE_PREFIX};
pub use server::{GatewayConfig, GatewayServer, USER_ID_HEADER};
pub use service::{FlyIdService, DEFAULT_HISTORY_LIMIT};
pub use source::LocalImageSource;
pub use tracing_layer::configure_tracing;
