use anyhow::Result;
use tracing::{debug, info};

use crate::adapters::llm::{
    create_adapter, LLMAdapter, LLMRequest, ModelConfig, Provider, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE,
};
use crate::core::CommitPromptBuilder;

/// Everything needed to ask a provider for a commit message.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub provider: Provider,
    pub model: Option<String>,
    pub diff: String,
    pub language: String,
    pub custom_prompt: Option<String>,
}

impl GenerationRequest {
    pub fn model_config(&self, api_key: &str, base_url: Option<String>) -> ModelConfig {
        ModelConfig::new(self.provider, self.model.clone(), api_key).with_base_url(base_url)
    }
}

/// Generates a commit message with the provider selected in `request`.
pub async fn generate(
    request: &GenerationRequest,
    api_key: &str,
    base_url: Option<String>,
) -> Result<String> {
    let adapter = create_adapter(&request.model_config(api_key, base_url))?;
    info!(
        "Generating message with {} ({})",
        request.provider,
        adapter.model_name()
    );
    generate_with(adapter.as_ref(), request).await
}

pub async fn generate_with(adapter: &dyn LLMAdapter, request: &GenerationRequest) -> Result<String> {
    let (system_prompt, user_prompt) = CommitPromptBuilder::build_commit_prompt(
        &request.diff,
        &request.language,
        request.custom_prompt.as_deref(),
    );

    let response = adapter
        .complete(LLMRequest {
            system_prompt,
            user_prompt,
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        })
        .await?;

    if let Some(usage) = &response.usage {
        debug!(
            "{} used {} prompt + {} completion tokens",
            response.model, usage.prompt_tokens, usage.completion_tokens
        );
    }

    Ok(response.content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::LLMResponse;
    use async_trait::async_trait;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingAdapter {
        reply: String,
        seen: Mutex<Option<LLMRequest>>,
    }

    #[async_trait]
    impl LLMAdapter for RecordingAdapter {
        async fn complete(&self, request: LLMRequest) -> Result<LLMResponse> {
            *self.seen.lock().unwrap() = Some(request);
            Ok(LLMResponse {
                content: self.reply.clone(),
                model: "recording".to_string(),
                usage: None,
            })
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn request(provider: Provider, model: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            provider,
            model: model.map(str::to_string),
            diff: "+fn main() {}".to_string(),
            language: "german".to_string(),
            custom_prompt: Some("Mention the ticket".to_string()),
        }
    }

    #[tokio::test]
    async fn trims_and_forwards_prompt() {
        let adapter = RecordingAdapter {
            reply: "\n  feat(cli): add entry point \n".to_string(),
            seen: Mutex::new(None),
        };

        let message = generate_with(&adapter, &request(Provider::OpenAI, None))
            .await
            .unwrap();

        assert_eq!(message, "feat(cli): add entry point");
        let seen = adapter.seen.lock().unwrap().take().unwrap();
        assert!(seen.user_prompt.contains("german"));
        assert!(seen.user_prompt.contains("Mention the ticket"));
        assert!(seen.user_prompt.contains("+fn main() {}"));
        assert_eq!(seen.max_tokens, Some(500));
    }

    #[tokio::test]
    async fn openai_defaults_model_when_not_overridden() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({"model": "gpt-4o-mini"})))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"fix(x): y\n"}}]}"#)
            .create_async()
            .await;

        let message = generate(&request(Provider::OpenAI, None), "key", Some(server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(message, "fix(x): y");
    }

    #[tokio::test]
    async fn anthropic_uses_override_model_and_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "secret")
            .match_body(Matcher::PartialJson(json!({"model": "claude-opus-4-1"})))
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":" fix(x): y "}]}"#)
            .create_async()
            .await;

        let message = generate(
            &request(Provider::Anthropic, Some("claude-opus-4-1")),
            "secret",
            Some(server.url()),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(message, "fix(x): y");
    }
}
