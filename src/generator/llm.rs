//! OpenAI-compatible chat-completions generator.

use super::prompt::{build_prompt, clean_generated_sql};
use super::{GenerationContext, GeneratorKind, SqlGenerator};
use crate::config::LlmConfig;
use crate::error::{Nl2SqlError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

const SYSTEM_PROMPT: &str =
    "You translate questions into a single PostgreSQL SELECT statement. Return only SQL.";

/// Sampling parameters that can be changed while the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub max_tokens: u32,
    pub temperature: f32,
}

pub struct LlmGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    parameters: RwLock<ModelParameters>,
}

impl LlmGenerator {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            parameters: RwLock::new(ModelParameters {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            }),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn parameters(&self) -> ModelParameters {
        *self.parameters.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply whichever parameters are given and return the new set.
    pub fn update_parameters(
        &self,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> ModelParameters {
        let mut parameters = self.parameters.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(max_tokens) = max_tokens {
            parameters.max_tokens = max_tokens;
        }
        if let Some(temperature) = temperature {
            parameters.temperature = temperature;
        }
        info!(
            "Model parameters updated: max_tokens={}, temperature={}",
            parameters.max_tokens, parameters.temperature
        );
        *parameters
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let parameters = self.parameters();
        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": parameters.temperature,
            "max_tokens": parameters.max_tokens
        })
    }

    async fn call_llm(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| Nl2SqlError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Nl2SqlError::Llm(format!("LLM API returned {}: {}", status, body)));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Nl2SqlError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        response_json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Nl2SqlError::Llm("No content in LLM response".to_string()))
    }
}

#[async_trait]
impl SqlGenerator for LlmGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Llm
    }

    async fn generate(&self, ctx: &GenerationContext) -> Result<String> {
        let prompt = build_prompt(ctx);
        debug!("LLM prompt:\n{}", prompt);
        let raw = self.call_llm(&prompt).await?;
        let sql = clean_generated_sql(&raw);
        if sql.is_empty() {
            return Err(Nl2SqlError::Generation("Model returned no SQL".to_string()));
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            api_key: "test-key".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: base_url.to_string(),
            max_tokens: 512,
            temperature: 0.7,
        }
    }

    #[test]
    fn test_update_parameters_is_partial() {
        let generator = LlmGenerator::new(&config("https://api.openai.com/v1/"));
        let updated = generator.update_parameters(Some(256), None);
        assert_eq!(updated.max_tokens, 256);
        assert_eq!(updated.temperature, 0.7);
        assert_eq!(generator.parameters(), updated);
    }

    #[test]
    fn test_request_body_carries_parameters() {
        let generator = LlmGenerator::new(&config("https://api.openai.com/v1"));
        generator.update_parameters(None, Some(0.0));
        let body = generator.request_body("Show me all users");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][1]["content"], "Show me all users");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_llm_error() {
        let generator = LlmGenerator::new(&config("http://127.0.0.1:1"));
        let err = generator
            .generate(&GenerationContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Nl2SqlError::Llm(_)));
    }
}
