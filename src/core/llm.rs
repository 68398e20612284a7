use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::HttpConfig;
use crate::error::GenError;

/// One request per prompt. Implementations report failures as errors; turning
/// them into empty responses is the dispatcher's job.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completion client for an OpenAI-compatible endpoint. Built once per
/// run; the inner `reqwest::Client` pools connections for every worker.
pub struct ChatClient {
    client: Client,
    endpoint: String,
    params: ChatParams,
}

impl ChatClient {
    pub fn new(params: ChatParams, http: &HttpConfig, pool_size: usize) -> Result<Self, GenError> {
        let client = Client::builder()
            .timeout(http.timeout())
            .connect_timeout(http.connect_timeout())
            .pool_idle_timeout(http.pool_idle_timeout())
            .pool_max_idle_per_host(pool_size)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client,
            endpoint: chat_endpoint(&params.base_url),
            params,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn chat(&self, prompt: &str) -> Result<String, GenError> {
        let request = ChatRequest {
            model: &self.params.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.params.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenError::Upstream {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let bytes = response.bytes().await?;
        let completion: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| GenError::SchemaParse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GenError::EmptyCompletion)
    }
}

#[async_trait]
impl Completer for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenError> {
        self.chat(prompt).await
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}
