#![deny(unused)]
//! Model Gateway for FlyID.
//!
//! This crate provides:
//! - An OpenAI-compatible completion client
//! - The fixed instruction texts
//! - Analysis request construction
//! - The analysis and chat clients

pub mod analysis;
pub mod chat;
pub mod openai_client;
pub mod prompts;
pub mod request;

pub use analysis::{AnalysisClient, DEFAULT_PERSIST_THRESHOLD};
pub use chat::ChatClient;
pub use openai_client::{OpenAiClient, OpenAiConfig};
pub use request::AnalysisRequestBuilder;

use flyid_core::config::ModelConfig;

/// Create the completion client from the application's model section.
pub fn create_client_from_config(config: &ModelConfig) -> flyid_core::Result<OpenAiClient> {
    let openai = OpenAiConfig::from_model_config(config);
    if openai.api_key.is_none() {
        tracing::warn!("No API key configured. Set FLYID__MODEL__API_KEY or OPENAI_API_KEY");
    }
    OpenAiClient::new(openai)
}
