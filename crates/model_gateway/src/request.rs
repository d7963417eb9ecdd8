//! Analysis request construction.

use flyid_core::types::{
    ChatRole, CompletionRequest, ContentPart, EncodedImage, ImageUrl, MessageContent,
    RequestMessage, ResponseFormat,
};

use crate::prompts::{ANALYSIS_SYSTEM_PROMPT, ANALYSIS_USER_INSTRUCTION};

/// Default output ceiling for analysis completions.
pub const DEFAULT_ANALYSIS_MAX_TOKENS: u32 = 600;

/// Builds the vision request for one image. Pure construction.
#[derive(Debug, Clone)]
pub struct AnalysisRequestBuilder {
    system_prompt: String,
    user_instruction: String,
    max_completion_tokens: u32,
}

impl Default for AnalysisRequestBuilder {
    fn default() -> Self {
        Self {
            system_prompt: ANALYSIS_SYSTEM_PROMPT.to_string(),
            user_instruction: ANALYSIS_USER_INSTRUCTION.to_string(),
            max_completion_tokens: DEFAULT_ANALYSIS_MAX_TOKENS,
        }
    }
}

impl AnalysisRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output ceiling.
    pub fn with_max_completion_tokens(mut self, max: u32) -> Self {
        self.max_completion_tokens = max;
        self
    }

    /// System turn, user turn (text + image), JSON-object output.
    pub fn build(&self, image: &EncodedImage) -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                RequestMessage::text(ChatRole::System, self.system_prompt.clone()),
                RequestMessage {
                    role: ChatRole::User,
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: self.user_instruction.clone(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image.data_url(),
                            },
                        },
                    ]),
                },
            ],
            max_completion_tokens: self.max_completion_tokens,
            response_format: Some(ResponseFormat::JsonObject),
        }
    }
}
