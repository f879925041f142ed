//! services/api/src/adapters/report_llm.rs
//!
//! This module contains the adapter for the one-shot evaluation LLM used to
//! synthesize a report from the transcript when the closing turn did not
//! produce one. It implements the `EvaluationService` port from the `core`
//! crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use interview_core::ports::{EvaluationService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `EvaluationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiEvaluationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEvaluationAdapter {
    /// Creates a new `OpenAiEvaluationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `EvaluationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl EvaluationService for OpenAiEvaluationAdapter {
    /// Runs one stateless generation over the report prompt. Low temperature
    /// because the output is expected to be structured JSON; the caller's
    /// extractor handles whatever comes back anyway.
    async fn evaluate(&self, prompt: &str) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.3)
            .max_completion_tokens(2500u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Evaluation LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Evaluation LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
