use crate::adapters::llm::{LLMAdapter, LLMError, LLMRequest, LLMResponse, ModelConfig, Usage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct OpenAIAdapter {
    client: Client,
    config: ModelConfig,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<OpenAIUsage>,
    #[serde(default)]
    model: String,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

impl OpenAIAdapter {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let base_url = config.resolved_base_url();
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn complete(&self, request: LLMRequest) -> Result<LLMResponse> {
        let messages = vec![
            Message {
                role: "system".to_string(),
                content: request.system_prompt,
            },
            Message {
                role: "user".to_string(),
                content: request.user_prompt,
            },
        ];

        let openai_request = OpenAIRequest {
            model: self.config.model_name.clone(),
            messages,
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Api {
                provider: self.config.provider,
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(LLMError::EmptyResponse {
                provider: self.config.provider,
            })?;

        let model = if openai_response.model.is_empty() {
            self.config.model_name.clone()
        } else {
            openai_response.model
        };

        Ok(LLMResponse {
            content,
            model,
            usage: openai_response.usage.map(|usage| Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            }),
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::Provider;
    use mockito::Matcher;
    use serde_json::json;

    fn request() -> LLMRequest {
        LLMRequest {
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    fn adapter(server: &mockito::Server, model: Option<&str>) -> OpenAIAdapter {
        let config = ModelConfig::new(Provider::OpenAI, model.map(str::to_string), "test-key")
            .with_base_url(Some(server.url()));
        OpenAIAdapter::new(config).unwrap()
    }

    #[tokio::test]
    async fn sends_chat_completion_with_defaults() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "system"},
                    {"role": "user", "content": "user"}
                ],
                "temperature": 0.3,
                "max_tokens": 500
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"fix(x): y"}}]}"#)
            .create_async()
            .await;

        let response = adapter(&server, None).complete(request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "fix(x): y");
        assert_eq!(response.model, "gpt-4o-mini");
        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn uses_model_override() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({"model": "gpt-4o"})))
            .with_status(200)
            .with_body(
                r#"{"model":"gpt-4o","choices":[{"message":{"content":"test"}}],
                    "usage":{"prompt_tokens":10,"completion_tokens":2,"total_tokens":12}}"#,
            )
            .create_async()
            .await;

        let response = adapter(&server, Some("gpt-4o"))
            .complete(request())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.model, "gpt-4o");
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(12));
    }

    #[tokio::test]
    async fn non_success_status_carries_code_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let err = adapter(&server, None).complete(request()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("OpenAI"));
        assert!(message.contains("401"));
        assert!(message.contains("invalid api key"));
    }

    #[tokio::test]
    async fn empty_choices_is_an_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = adapter(&server, None).complete(request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LLMError>(),
            Some(LLMError::EmptyResponse {
                provider: Provider::OpenAI
            })
        ));
        assert_eq!(err.to_string(), "OpenAI returned empty response");
    }

    #[tokio::test]
    async fn null_content_is_an_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":null}}]}"#)
            .create_async()
            .await;

        let err = adapter(&server, None).complete(request()).await.unwrap_err();
        assert!(err.to_string().contains("empty response"));
    }
}
