use crate::api::GenerateRequest;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Key used when neither the flag nor the environment provides one. Local
/// inference servers accept any non-empty key.
pub const FALLBACK_API_KEY: &str = "EMPTY";

#[derive(Parser, Debug)]
#[command(name = "batchgen")]
#[command(author, version, about = "Generate responses for a JSONL prompt set via an OpenAI-compatible API", long_about = None)]
pub struct Cli {
    /// Path to the input JSONL file (one {"prompt": ...} per line)
    #[arg(long = "input_data", alias = "input-data")]
    pub input_data: PathBuf,

    /// Path to save responses
    #[arg(long = "output_path", alias = "output-path")]
    pub output_path: PathBuf,

    /// Model name/identifier
    #[arg(long = "model_name", alias = "model-name")]
    pub model_name: String,

    /// API base URL
    #[arg(long = "base_url", alias = "base-url", default_value = "http://localhost:8000/v1")]
    pub base_url: String,

    /// API key (or set via env)
    #[arg(long = "api_key", alias = "api-key")]
    pub api_key: Option<String>,

    /// Env var for API key
    #[arg(long = "api_key_env", alias = "api-key-env", default_value = "OPENAI_COMPATIBLE_API_KEY")]
    pub api_key_env: String,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.0)]
    pub temperature: f32,

    /// Max tokens to generate
    #[arg(long = "max_tokens", alias = "max-tokens", default_value_t = 2048)]
    pub max_tokens: u32,

    /// Number of parallel workers
    #[arg(long, default_value = "50")]
    pub workers: NonZeroUsize,
}

impl Cli {
    /// Resolve the API key and build the run request. `lookup` reads an
    /// environment variable.
    pub fn into_request(self, lookup: impl Fn(&str) -> Option<String>) -> GenerateRequest {
        let api_key = resolve_api_key(self.api_key.as_deref(), &self.api_key_env, lookup);

        GenerateRequest {
            input_data: self.input_data,
            output_path: self.output_path,
            model_name: self.model_name,
            base_url: self.base_url,
            api_key,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            workers: self.workers.get(),
        }
    }
}

/// Explicit key, then the named environment variable, then [`FALLBACK_API_KEY`].
/// Empty values count as unset.
pub fn resolve_api_key(
    explicit: Option<&str>,
    env_name: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    explicit
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .or_else(|| lookup(env_name).filter(|key| !key.is_empty()))
        .unwrap_or_else(|| FALLBACK_API_KEY.to_string())
}
