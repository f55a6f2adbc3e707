use crate::{
    model::{LanguageModel, ModelProvider},
    Error, Result,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
pub const DEFAULT_MODEL: &str = "glm-4-flash";

const TEMPERATURE: f32 = 0.3;
/// Enough for a full translation batch
const MAX_TOKENS: u32 = 4096;

const SYSTEM_PROMPT: &str =
    "You are a concise assistant that reports on open-source repository activity.";

/// Zhipu GLM chat-completions client
pub struct ZhipuModel {
    client: Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl ZhipuModel {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    async fn call_api(&self, messages: Vec<Message>) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&json!({
                "model": &self.model,
                "messages": messages,
                "temperature": TEMPERATURE,
                "top_p": 0.7,
                "max_tokens": MAX_TOKENS,
            }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(Error::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(Error::RateLimitExceeded),
            _ => {
                let error_text = response.text().await?;
                return Err(Error::ApiError(format!("Zhipu API error: {}", error_text)));
            }
        }

        let result: ChatResponse = response.json().await?;
        result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::ParseError("Zhipu response had no choices".to_string()))
    }
}

#[async_trait]
impl LanguageModel for ZhipuModel {
    fn provider(&self) -> ModelProvider {
        ModelProvider::Zhipu
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.model, "Zhipu completion ({} chars)", prompt.len());

        let messages = vec![
            Message {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ];

        self.call_api(messages).await
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn model(server: &mockito::Server) -> ZhipuModel {
        ZhipuModel::new("test_key".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_api_url(server.url())
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test_key")
            .match_body(Matcher::PartialJson(json!({
                "model": DEFAULT_MODEL,
                "max_tokens": MAX_TOKENS,
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Summary text"}}]}"#)
            .create_async()
            .await;

        let text = model(&server).complete("Summarize").await.unwrap();
        assert_eq!(text, "Summary text");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_bad_key_is_typed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .create_async()
            .await;

        assert!(matches!(
            model(&server).complete("x").await,
            Err(Error::InvalidApiKey)
        ));
    }
}
