//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the conversational interviewer LLM.
//! It implements the `ChatGateway` port from the `core` crate.
//!
//! The port's contract is send-one/receive-one against a stateful context:
//! the adapter accumulates the message history for each open `ChatHandle`
//! internally, so callers never reconstruct or resend history themselves.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        CreateChatCompletionRequestArgs, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use interview_core::{
    domain::ChatHandle,
    ports::{ChatGateway, PortError, PortResult},
    prompt::SEED_ACKNOWLEDGMENT,
};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatGateway` using an OpenAI-compatible LLM.
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    contexts: Mutex<HashMap<ChatHandle, Vec<ChatCompletionRequestMessage>>>,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self {
            client,
            model,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    fn build_user_message(
        message: &str,
        image_b64: Option<&str>,
    ) -> Result<ChatCompletionRequestMessage, OpenAIError> {
        let user_message = match image_b64 {
            Some(b64) => {
                let text_part = ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(message)
                    .build()?;
                let image_part = ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(
                        ImageUrlArgs::default()
                            .url(format!("data:image/jpeg;base64,{}", b64))
                            .build()?,
                    )
                    .build()?;
                ChatCompletionRequestUserMessageArgs::default()
                    .content(ChatCompletionRequestUserMessageContent::Array(vec![
                        text_part.into(),
                        image_part.into(),
                    ]))
                    .build()?
            }
            None => ChatCompletionRequestUserMessageArgs::default()
                .content(message)
                .build()?,
        };
        Ok(user_message.into())
    }
}

//=========================================================================================
// `ChatGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatGateway for OpenAiChatAdapter {
    /// Opens a conversational context seeded with the system prompt and the
    /// scripted acknowledgment, before the first real exchange.
    async fn open(&self, system_prompt: &str) -> PortResult<ChatHandle> {
        let seed: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(SEED_ACKNOWLEDGMENT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let handle = ChatHandle::new();
        self.contexts.lock().await.insert(handle, seed);
        info!(handle = %handle.0, "Opened chat context");
        Ok(handle)
    }

    async fn send(
        &self,
        handle: &ChatHandle,
        message: &str,
        image_b64: Option<&str>,
    ) -> PortResult<String> {
        let user_message = Self::build_user_message(message, image_b64)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Snapshot the history without holding the lock across the network
        // call; per-session turns are already serialized upstream.
        let mut messages = {
            let contexts = self.contexts.lock().await;
            contexts
                .get(handle)
                .cloned()
                .ok_or_else(|| PortError::SessionNotFound(handle.0.to_string()))?
        };
        messages.push(user_message.clone());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .max_completion_tokens(500u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // No timeout here on purpose: generation length is unbounded and
        // acceptable latency is minutes, not seconds.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Chat LLM response contained no text content.".to_string())
            })?;

        let assistant_message: ChatCompletionRequestMessage =
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(content.clone())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into();

        // Commit the exchange to the accumulated context.
        if let Some(history) = self.contexts.lock().await.get_mut(handle) {
            history.push(user_message);
            history.push(assistant_message);
        }

        Ok(content)
    }

    async fn close(&self, handle: &ChatHandle) {
        if self.contexts.lock().await.remove(handle).is_some() {
            info!(handle = %handle.0, "Closed chat context");
        }
    }
}
