//! Chat completion clients (OpenAI-compatible and Ollama)

use crate::LlmError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_LLM_PROVIDER: &str = "openai";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "phi4-mini:latest";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Completes a two-message chat (system instruction + user prompt)
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete_chat(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatProvider {
    /// `POST {url}/chat/completions`
    OpenAi,
    /// `POST {url}/api/chat`
    Ollama,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    provider: ChatProvider,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(provider: ChatProvider, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            provider,
            model: model.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }

    /// Client configured from `LLM_PROVIDER`, `LLM_URL`, `LLM_MODEL`,
    /// `LLM_API_KEY` and `LLM_TIMEOUT_SECS`
    pub fn default_local() -> Self {
        let provider = env_or_default("LLM_PROVIDER", DEFAULT_LLM_PROVIDER);
        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

        let client = if provider.eq_ignore_ascii_case("ollama") {
            Self::new(
                ChatProvider::Ollama,
                env_or_default("LLM_URL", DEFAULT_OLLAMA_URL),
                env_or_default("LLM_MODEL", DEFAULT_OLLAMA_MODEL),
            )
        } else {
            Self::new(
                ChatProvider::OpenAi,
                env_or_default("LLM_URL", DEFAULT_OPENAI_URL),
                env_or_default("LLM_MODEL", DEFAULT_OPENAI_MODEL),
            )
        };

        let client = client.with_timeout(Duration::from_secs(timeout_secs));
        match std::env::var("LLM_API_KEY") {
            Ok(key) if !key.trim().is_empty() => client.with_api_key(key),
            _ => client,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn health(&self) -> Result<bool, LlmError> {
        let url = match self.provider {
            ChatProvider::OpenAi => format!("{}/models", self.base_url),
            ChatProvider::Ollama => format!("{}/api/tags", self.base_url),
        };
        let mut request = self.client.get(&url).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        Ok(response.status().is_success())
    }

    fn messages<'a>(system_prompt: &'a str, user_prompt: &'a str) -> Vec<ChatMessage<'a>> {
        vec![
            ChatMessage {
                role: "system",
                content: system_prompt,
            },
            ChatMessage {
                role: "user",
                content: user_prompt,
            },
        ]
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, LlmError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, LlmError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| LlmError::Malformed(format!("{} ({})", e, body)))
    }

    async fn openai_chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = OpenAiChatRequest {
            model: &self.model,
            messages: Self::messages(system_prompt, user_prompt),
        };

        let response: OpenAiChatResponse = self.post_json(&url, &request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                "Completion usage: prompt={} completion={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyCompletion)
    }

    async fn ollama_chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = OllamaChatRequest {
            model: &self.model,
            messages: Self::messages(system_prompt, user_prompt),
            stream: false,
        };

        let response: OllamaChatResponse = self.post_json(&url, &request).await?;
        if let Some(done_reason) = response.done_reason.as_deref() {
            debug!("Ollama chat done_reason={}", done_reason);
        }

        Ok(response.message.content)
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    #[instrument(skip(self, system_prompt, user_prompt), fields(model = %self.model))]
    async fn complete_chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, LlmError> {
        let content = match self.provider {
            ChatProvider::OpenAi => self.openai_chat(system_prompt, user_prompt).await?,
            ChatProvider::Ollama => self.ollama_chat(system_prompt, user_prompt).await?,
        };

        if content.trim().is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(content)
    }
}

// ==========================================
// REQUEST/RESPONSE TYPES
// ==========================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}
