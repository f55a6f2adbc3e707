use crate::{Error, OllamaModel, Result, ZhipuModel};
use async_trait::async_trait;
use repopulse_core::Settings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelProvider {
    Zhipu,
    Ollama,
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelProvider::Zhipu => write!(f, "zhipu"),
            ModelProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zhipu" | "glm" => Ok(ModelProvider::Zhipu),
            "ollama" => Ok(ModelProvider::Ollama),
            _ => Err(format!("Unknown model provider: {}", s)),
        }
    }
}

/// A text-completion model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn provider(&self) -> ModelProvider;

    /// Single-turn completion of `prompt`
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Build the configured model.
///
/// `Ok(None)` when no provider is configured; `ConfigError` when one is
/// named but its settings are incomplete.
pub fn build_model(settings: &Settings) -> Result<Option<Arc<dyn LanguageModel>>> {
    let Some(raw) = settings
        .llm_provider
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("none"))
    else {
        return Ok(None);
    };

    let provider: ModelProvider = raw.parse().map_err(Error::ConfigError)?;
    let timeout = settings.http_timeout();
    let model_name = settings
        .llm_model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    let model: Arc<dyn LanguageModel> = match provider {
        ModelProvider::Zhipu => {
            let api_key = settings
                .zhipu_api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .ok_or_else(|| Error::ConfigError("ZHIPU_API_KEY not set".to_string()))?;

            let mut model = ZhipuModel::new(api_key.to_string(), timeout)?;
            if let Some(name) = model_name {
                model = model.with_model(name.to_string());
            }
            if let Some(url) = settings.zhipu_base_url.as_deref().filter(|u| !u.trim().is_empty()) {
                model = model.with_api_url(url.to_string());
            }
            Arc::new(model)
        }
        ModelProvider::Ollama => {
            let base_url = settings
                .ollama_base_url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(crate::ollama::DEFAULT_BASE_URL);

            let mut model = OllamaModel::new(base_url.to_string(), timeout)?;
            if let Some(name) = model_name {
                model = model.with_model(name.to_string());
            }
            Arc::new(model)
        }
    };

    tracing::info!("Language model configured: {}", provider);
    Ok(Some(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("zhipu".parse::<ModelProvider>().unwrap(), ModelProvider::Zhipu);
        assert_eq!("Ollama".parse::<ModelProvider>().unwrap(), ModelProvider::Ollama);
        assert!("gpt".parse::<ModelProvider>().is_err());
    }

    #[test]
    fn test_no_provider_means_no_model() {
        let settings = Settings::default();
        assert!(build_model(&settings).unwrap().is_none());
    }

    #[test]
    fn test_zhipu_without_key_is_config_error() {
        let settings = Settings {
            llm_provider: Some("zhipu".to_string()),
            ..Settings::default()
        };
        assert!(matches!(build_model(&settings), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let settings = Settings {
            llm_provider: Some("ollama".to_string()),
            ..Settings::default()
        };
        let model = build_model(&settings).unwrap().unwrap();
        assert_eq!(model.provider(), ModelProvider::Ollama);
    }
}
